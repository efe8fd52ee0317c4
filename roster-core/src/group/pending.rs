//! Provenance of local-pending members

use super::ChangeReason;
use crate::handles::{Handle, HandleRef, HandleRepo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Who put a handle into local-pending, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPendingInfo {
    actor: Option<HandleRef>,
    pub reason: ChangeReason,
    pub message: String,
}

impl LocalPendingInfo {
    pub fn new(
        repo: &Arc<dyn HandleRepo>,
        actor: Handle,
        reason: ChangeReason,
        message: &str,
    ) -> Self {
        let actor = (!actor.is_none()).then(|| HandleRef::new(Arc::clone(repo), actor));
        Self { actor, reason, message: message.to_string() }
    }

    /// The actor, or `Handle::NONE` when unspecified
    pub fn actor(&self) -> Handle {
        self.actor.as_ref().map(HandleRef::handle).unwrap_or(Handle::NONE)
    }
}

/// One row of the local-pending-with-info listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPendingEntry {
    pub handle: Handle,
    pub actor: Handle,
    pub reason: ChangeReason,
    pub message: String,
}

/// Exactly one [`LocalPendingInfo`] per local-pending handle.
///
/// The membership core keeps this in lockstep with its local-pending set;
/// the ledger itself only stores and drops entries.
#[derive(Debug, Default)]
pub struct PendingLedger {
    entries: BTreeMap<Handle, LocalPendingInfo>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record provenance for a handle. An existing entry is kept.
    pub fn insert(&mut self, handle: Handle, info: LocalPendingInfo) -> bool {
        if self.entries.contains_key(&handle) {
            return false;
        }
        self.entries.insert(handle, info);
        true
    }

    /// Drop the entry for a handle, releasing its actor reference
    pub fn remove(&mut self, handle: Handle) -> Option<LocalPendingInfo> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&LocalPendingInfo> {
        self.entries.get(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.keys().copied()
    }

    pub fn entries(&self) -> Vec<LocalPendingEntry> {
        self.entries
            .iter()
            .map(|(handle, info)| LocalPendingEntry {
                handle: *handle,
                actor: info.actor(),
                reason: info.reason,
                message: info.message.clone(),
            })
            .collect()
    }
}
