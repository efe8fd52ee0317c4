//! Group membership tracking for multi-party channels
//!
//! A [`GroupMembership`] keeps the members of a channel together with the
//! handles that are waiting for local or remote approval, and reports every
//! net change to its observers. Handles come from a [`HandleRepo`] that
//! reference-counts them for as long as the group stores them.

pub mod config;
pub mod group;
pub mod handles;
pub mod logging;
pub mod metrics;
pub mod test_utils;

pub use config::Config;
pub use group::{
    ChangeReason, GroupError, GroupEvent, GroupFlags, GroupMembership, MembersChanged,
    MembershipChange,
};
pub use handles::{Handle, HandleRepo, MemoryHandleRepo};
pub use logging::{init_logging, LogLevel};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = LogLevel::Info;
        let _ = GroupFlags::CAN_ADD;
        let _ = ChangeReason::default();
        let _ = Config::default();
        assert!(Handle::NONE.is_none());
    }
}
