//! In-process handle registry

use super::{Handle, HandleRepo};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

#[derive(Debug)]
struct Entry {
    name: String,
    refs: usize,
}

#[derive(Debug, Default)]
struct Registry {
    entries: HashMap<Handle, Entry>,
    by_name: HashMap<String, Handle>,
    next: u32,
}

/// Thread-safe registry mapping names to handles and counting references.
///
/// Handles are never reclaimed, so a handle stays valid for the lifetime of
/// the registry even when its count drops to zero.
#[derive(Debug, Default)]
pub struct MemoryHandleRepo {
    inner: RwLock<Registry>,
}

impl MemoryHandleRepo {
    /// Create an empty registry; the first handle issued is 1
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Registry { next: 1, ..Default::default() }),
        }
    }

    /// Return the handle for `name`, registering it on first use
    pub fn ensure(&self, name: &str) -> Handle {
        let mut reg = self.write();
        if let Some(handle) = reg.by_name.get(name) {
            return *handle;
        }

        let handle = Handle(reg.next);
        reg.next += 1;
        reg.entries.insert(handle, Entry { name: name.to_string(), refs: 0 });
        reg.by_name.insert(name.to_string(), handle);
        handle
    }

    /// Look up a previously registered name
    pub fn lookup(&self, name: &str) -> Option<Handle> {
        self.read().by_name.get(name).copied()
    }

    /// Number of outstanding references on a handle
    pub fn refcount(&self, handle: Handle) -> usize {
        self.read().entries.get(&handle).map(|e| e.refs).unwrap_or(0)
    }

    /// Sum of outstanding references across every handle
    pub fn outstanding(&self) -> usize {
        self.read().entries.values().map(|e| e.refs).sum()
    }

    /// Number of registered handles
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HandleRepo for MemoryHandleRepo {
    fn is_valid(&self, handle: Handle) -> bool {
        !handle.is_none() && self.read().entries.contains_key(&handle)
    }

    fn acquire(&self, handle: Handle) {
        match self.write().entries.get_mut(&handle) {
            Some(entry) => entry.refs += 1,
            None => warn!(%handle, "acquire on unknown handle"),
        }
    }

    fn release(&self, handle: Handle) {
        match self.write().entries.get_mut(&handle) {
            Some(entry) if entry.refs > 0 => entry.refs -= 1,
            Some(_) => warn!(%handle, "release on handle with no references"),
            None => warn!(%handle, "release on unknown handle"),
        }
    }

    fn inspect(&self, handle: Handle) -> Option<String> {
        self.read().entries.get(&handle).map(|e| e.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_is_idempotent() {
        let repo = MemoryHandleRepo::new();
        let a = repo.ensure("alice@example.com");
        let b = repo.ensure("bob@example.com");

        assert_eq!(a, Handle(1));
        assert_eq!(b, Handle(2));
        assert_eq!(repo.ensure("alice@example.com"), a);
        assert_eq!(repo.len(), 2);
        assert_eq!(repo.lookup("bob@example.com"), Some(b));
        assert_eq!(repo.lookup("carol@example.com"), None);
    }

    #[test]
    fn test_validity() {
        let repo = MemoryHandleRepo::new();
        let a = repo.ensure("alice");

        assert!(repo.is_valid(a));
        assert!(!repo.is_valid(Handle::NONE));
        assert!(!repo.is_valid(Handle(17)));
    }

    #[test]
    fn test_refcounting() {
        let repo = MemoryHandleRepo::new();
        let a = repo.ensure("alice");

        repo.acquire(a);
        repo.acquire(a);
        assert_eq!(repo.refcount(a), 2);
        assert_eq!(repo.outstanding(), 2);

        repo.release(a);
        repo.release(a);
        assert_eq!(repo.refcount(a), 0);

        // Over-release is logged, not underflowed
        repo.release(a);
        assert_eq!(repo.refcount(a), 0);
    }

    #[test]
    fn test_inspect() {
        let repo = MemoryHandleRepo::new();
        let a = repo.ensure("alice");

        assert_eq!(repo.inspect(a).as_deref(), Some("alice"));
        assert_eq!(repo.inspect(Handle(9)), None);
    }
}
