//! Channel-specific handle → owner mapping

use super::GroupError;
use crate::handles::{Handle, HandleRef, HandleRepo};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct OwnerEntry {
    // Held for the reference only; the key is the same handle.
    _local: HandleRef,
    owner: HandleRef,
}

/// Maps channel-specific handles to their real owners.
///
/// Each entry holds one reference on the local handle and one on the owner.
/// A key can only be mapped once; clear it before mapping it again.
pub struct OwnerMap {
    repo: Arc<dyn HandleRepo>,
    entries: BTreeMap<Handle, OwnerEntry>,
}

impl OwnerMap {
    pub fn new(repo: Arc<dyn HandleRepo>) -> Self {
        Self { repo, entries: BTreeMap::new() }
    }

    pub fn set_owner(&mut self, local: Handle, owner: Handle) -> Result<(), GroupError> {
        if let Some(existing) = self.entries.get(&local) {
            return Err(GroupError::OwnerAlreadySet { local, owner: existing.owner.handle() });
        }

        self.entries.insert(
            local,
            OwnerEntry {
                _local: HandleRef::new(Arc::clone(&self.repo), local),
                owner: HandleRef::new(Arc::clone(&self.repo), owner),
            },
        );
        Ok(())
    }

    /// Remove a mapping, returning the owner it pointed at
    pub fn clear_owner(&mut self, local: Handle) -> Option<Handle> {
        self.entries.remove(&local).map(|entry| entry.owner.handle())
    }

    pub fn owner_of(&self, local: Handle) -> Option<Handle> {
        self.entries.get(&local).map(|entry| entry.owner.handle())
    }

    /// Drop the mappings keyed by any of `handles`; returns how many went
    pub fn remove_all(&mut self, handles: &BTreeSet<Handle>) -> usize {
        handles.iter().filter(|h| self.entries.remove(*h).is_some()).count()
    }

    /// Snapshot of every mapping, local → owner
    pub fn entries(&self) -> BTreeMap<Handle, Handle> {
        self.entries.iter().map(|(local, e)| (*local, e.owner.handle())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for OwnerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(local, e)| (local, e.owner.handle())))
            .finish()
    }
}
