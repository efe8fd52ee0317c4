//! Reference-holding handle wrappers

use super::{Handle, HandleRepo};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// One held reference on a handle.
///
/// Creating or cloning a `HandleRef` acquires a reference, dropping it
/// releases one. `Handle::NONE` is carried without touching the registry.
pub struct HandleRef {
    repo: Arc<dyn HandleRepo>,
    handle: Handle,
}

impl HandleRef {
    pub fn new(repo: Arc<dyn HandleRepo>, handle: Handle) -> Self {
        if !handle.is_none() {
            repo.acquire(handle);
        }
        Self { repo, handle }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl Clone for HandleRef {
    fn clone(&self) -> Self {
        HandleRef::new(Arc::clone(&self.repo), self.handle)
    }
}

impl Drop for HandleRef {
    fn drop(&mut self) {
        if !self.handle.is_none() {
            self.repo.release(self.handle);
        }
    }
}

impl fmt::Debug for HandleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandleRef").field(&self.handle).finish()
    }
}

impl PartialEq for HandleRef {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for HandleRef {}

/// Ordered set of handles holding one reference per member
pub struct HandleSet {
    repo: Arc<dyn HandleRepo>,
    refs: BTreeMap<Handle, HandleRef>,
}

impl HandleSet {
    pub fn new(repo: Arc<dyn HandleRepo>) -> Self {
        Self { repo, refs: BTreeMap::new() }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.refs.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        self.refs.keys().copied()
    }

    /// Snapshot of the handles currently in the set
    pub fn to_set(&self) -> BTreeSet<Handle> {
        self.refs.keys().copied().collect()
    }

    /// Insert one handle; returns whether it was newly added
    pub fn insert(&mut self, handle: Handle) -> bool {
        if handle.is_none() || self.refs.contains_key(&handle) {
            return false;
        }
        self.refs.insert(handle, HandleRef::new(Arc::clone(&self.repo), handle));
        true
    }

    /// Remove one handle; returns whether it was present
    pub fn remove(&mut self, handle: Handle) -> bool {
        self.refs.remove(&handle).is_some()
    }

    /// Add every handle in `other`, returning the ones that were not already present
    pub fn update(&mut self, other: &BTreeSet<Handle>) -> BTreeSet<Handle> {
        other.iter().copied().filter(|h| self.insert(*h)).collect()
    }

    /// Remove every handle in `other`, returning the ones that were actually present
    pub fn difference_update(&mut self, other: &BTreeSet<Handle>) -> BTreeSet<Handle> {
        other.iter().copied().filter(|h| self.remove(*h)).collect()
    }
}

impl fmt::Debug for HandleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.refs.keys()).finish()
    }
}
