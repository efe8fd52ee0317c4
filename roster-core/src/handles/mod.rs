//! Handles and the registry that owns them
//!
//! A [`Handle`] is an opaque non-zero integer naming a contact, a room or an
//! actor. Handles are reference counted by a [`HandleRepo`]; anything that
//! stores a handle holds a [`HandleRef`] so the count always matches the
//! number of slots that hold it.

mod memory;
mod set;

pub use memory::MemoryHandleRepo;
pub use set::{HandleRef, HandleSet};

use crate::group::GroupError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a contact, room or actor
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Handle(pub u32);

impl Handle {
    /// The "no handle" value, used when a change has no known actor
    pub const NONE: Handle = Handle(0);

    pub fn new(raw: u32) -> Self {
        Handle(raw)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Handle {
    fn from(raw: u32) -> Self {
        Handle(raw)
    }
}

/// The identifier registry the membership core consumes.
///
/// Implementations must tolerate `acquire`/`release` on any handle for which
/// `is_valid` returned true; neither call may fail.
pub trait HandleRepo: Send + Sync {
    /// Whether the handle currently names something in this registry
    fn is_valid(&self, handle: Handle) -> bool;

    /// Take one reference on the handle
    fn acquire(&self, handle: Handle);

    /// Drop one reference on the handle
    fn release(&self, handle: Handle);

    /// Human-readable name for the handle, if it has one
    fn inspect(&self, handle: Handle) -> Option<String>;

    /// Check every handle, failing on the first invalid one
    fn validate_all(&self, handles: &[Handle]) -> Result<(), GroupError> {
        match handles.iter().find(|h| !self.is_valid(**h)) {
            Some(bad) => Err(GroupError::InvalidHandle(*bad)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_none() {
        assert!(Handle::NONE.is_none());
        assert!(!Handle(3).is_none());
        assert_eq!(Handle::default(), Handle::NONE);
    }

    #[test]
    fn test_handle_display_and_conversion() {
        assert_eq!(Handle::from(42).to_string(), "42");
        assert_eq!(Handle::new(7).as_u32(), 7);
    }

    #[test]
    fn test_handle_serializes_as_number() {
        let json = serde_json::to_string(&vec![Handle(1), Handle(5)]).unwrap();
        assert_eq!(json, "[1,5]");
    }

    #[test]
    fn test_validate_all_reports_first_invalid() {
        let repo = MemoryHandleRepo::new();
        let alice = repo.ensure("alice");

        assert!(repo.validate_all(&[alice]).is_ok());
        assert_eq!(
            repo.validate_all(&[alice, Handle(99), Handle::NONE]),
            Err(GroupError::InvalidHandle(Handle(99)))
        );
    }
}
