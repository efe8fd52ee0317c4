//! Group capability flags

use serde::{Deserialize, Serialize};
use std::fmt;

bitflags::bitflags! {
    /// Which membership transitions the channel currently permits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct GroupFlags: u32 {
        /// Members may be added, and invitations sent
        const CAN_ADD = 1;
        /// Members may be removed
        const CAN_REMOVE = 2;
        /// Remote-pending invitations may be rescinded
        const CAN_RESCIND = 4;
        /// A message may accompany an add
        const MESSAGE_ADD = 8;
        /// A message may accompany a remove
        const MESSAGE_REMOVE = 16;
        /// A message may accompany accepting a local-pending invitation
        const MESSAGE_ACCEPT = 32;
        /// A message may accompany rejecting a local-pending invitation
        const MESSAGE_REJECT = 64;
        /// A message may accompany rescinding a remote-pending invitation
        const MESSAGE_RESCIND = 128;
        /// Members are channel-specific aliases with separate owners
        const CHANNEL_SPECIFIC_HANDLES = 256;
    }
}

impl GroupFlags {
    /// Bracketed rendering used in diff logs, e.g. `[CAN_ADD|CAN_REMOVE]`
    pub fn bracketed(self) -> String {
        format!("[{}]", self.names().join("|"))
    }

    fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl Default for GroupFlags {
    fn default() -> Self {
        GroupFlags::empty()
    }
}

impl fmt::Display for GroupFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0");
        }
        write!(f, "{}", self.names().join("|"))
    }
}

/// Bits actually toggled by a flag change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlagsChange {
    pub added: GroupFlags,
    pub removed: GroupFlags,
}

impl FlagsChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Apply an add/remove request to `current`.
///
/// Bits already set are not re-added and bits already clear are not
/// removed. Additions are applied first, so a bit named in both masks
/// ends up cleared.
pub fn apply_flags_change(
    current: GroupFlags,
    add: GroupFlags,
    remove: GroupFlags,
) -> (GroupFlags, FlagsChange) {
    let added = add & !current;
    let next = current | added;

    let removed = remove & next;
    let next = next & !removed;

    (next, FlagsChange { added, removed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_values() {
        assert_eq!(GroupFlags::CAN_ADD.bits(), 1);
        assert_eq!(GroupFlags::MESSAGE_RESCIND.bits(), 128);
        assert_eq!(GroupFlags::CHANNEL_SPECIFIC_HANDLES.bits(), 256);
    }

    #[test]
    fn test_display() {
        assert_eq!(GroupFlags::empty().to_string(), "0");
        let flags = GroupFlags::CAN_ADD | GroupFlags::CAN_RESCIND;
        assert_eq!(flags.to_string(), "CAN_ADD|CAN_RESCIND");
        assert_eq!(GroupFlags::CAN_REMOVE.bracketed(), "[CAN_REMOVE]");
        assert_eq!(GroupFlags::empty().bracketed(), "[]");
    }

    #[test]
    fn test_add_only_new_bits() {
        let (next, change) = apply_flags_change(
            GroupFlags::CAN_ADD,
            GroupFlags::CAN_ADD | GroupFlags::CAN_REMOVE,
            GroupFlags::empty(),
        );
        assert_eq!(next, GroupFlags::CAN_ADD | GroupFlags::CAN_REMOVE);
        assert_eq!(change.added, GroupFlags::CAN_REMOVE);
        assert!(change.removed.is_empty());
    }

    #[test]
    fn test_remove_only_set_bits() {
        let (next, change) = apply_flags_change(
            GroupFlags::CAN_ADD,
            GroupFlags::empty(),
            GroupFlags::CAN_ADD | GroupFlags::CAN_RESCIND,
        );
        assert!(next.is_empty());
        assert!(change.added.is_empty());
        assert_eq!(change.removed, GroupFlags::CAN_ADD);
    }

    #[test]
    fn test_already_set_is_empty_change() {
        let (next, change) =
            apply_flags_change(GroupFlags::CAN_ADD, GroupFlags::CAN_ADD, GroupFlags::empty());
        assert_eq!(next, GroupFlags::CAN_ADD);
        assert!(change.is_empty());
    }

    #[test]
    fn test_bit_in_both_masks_ends_cleared() {
        let (next, change) =
            apply_flags_change(GroupFlags::empty(), GroupFlags::CAN_ADD, GroupFlags::CAN_ADD);
        assert!(next.is_empty());
        assert_eq!(change.added, GroupFlags::CAN_ADD);
        assert_eq!(change.removed, GroupFlags::CAN_ADD);
    }

    #[test]
    fn test_serde_text_form() {
        let flags = GroupFlags::CAN_ADD | GroupFlags::CAN_REMOVE;
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, "\"CAN_ADD | CAN_REMOVE\"");
        let back: GroupFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
