//! Membership error types

use super::flags::GroupFlags;
use crate::handles::Handle;
use thiserror::Error;

/// Broad error class, as reported to the RPC layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unknown handle, or a nonsensical request
    InvalidArgument,
    /// The group flags do not currently allow the transition
    PermissionDenied,
    /// The requested thing does not exist on this channel
    NotAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("invalid handle {0}")]
    InvalidHandle(Handle),

    #[error("unknown group change reason {0}")]
    InvalidReason(u32),

    #[error("handle {0} is not a member")]
    NotAMember(Handle),

    #[error("handle {local} is already owned by {owner}")]
    OwnerAlreadySet { local: Handle, owner: Handle },

    #[error("handle {handle} cannot be {operation} without {required}")]
    PermissionDenied {
        handle: Handle,
        operation: &'static str,
        required: GroupFlags,
    },

    #[error("handle {0} is not a current or pending member")]
    NotCurrentOrPending(Handle),

    #[error("channel doesn't have channel specific handles")]
    NoChannelSpecificHandles,

    #[error("request for handle {handle} rejected: {reason}")]
    Rejected { handle: Handle, reason: String },
}

impl GroupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroupError::InvalidHandle(_)
            | GroupError::InvalidReason(_)
            | GroupError::NotAMember(_)
            | GroupError::OwnerAlreadySet { .. } => ErrorKind::InvalidArgument,
            GroupError::PermissionDenied { .. } | GroupError::Rejected { .. } => {
                ErrorKind::PermissionDenied
            }
            GroupError::NotCurrentOrPending(_) | GroupError::NoChannelSpecificHandles => {
                ErrorKind::NotAvailable
            }
        }
    }

    /// The handle the error is about, when there is one
    pub fn handle(&self) -> Option<Handle> {
        match self {
            GroupError::InvalidHandle(h)
            | GroupError::NotAMember(h)
            | GroupError::NotCurrentOrPending(h) => Some(*h),
            GroupError::OwnerAlreadySet { local, .. } => Some(*local),
            GroupError::PermissionDenied { handle, .. } | GroupError::Rejected { handle, .. } => {
                Some(*handle)
            }
            GroupError::InvalidReason(_) | GroupError::NoChannelSpecificHandles => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(GroupError::InvalidHandle(Handle(1)).kind(), ErrorKind::InvalidArgument);
        assert_eq!(GroupError::NotAMember(Handle(1)).kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            GroupError::NotCurrentOrPending(Handle(1)).kind(),
            ErrorKind::NotAvailable
        );
        assert_eq!(GroupError::NoChannelSpecificHandles.kind(), ErrorKind::NotAvailable);
        assert_eq!(
            GroupError::Rejected { handle: Handle(2), reason: "busy".into() }.kind(),
            ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn test_permission_denied_display() {
        let err = GroupError::PermissionDenied {
            handle: Handle(5),
            operation: "added to members",
            required: GroupFlags::CAN_ADD,
        };
        assert_eq!(err.to_string(), "handle 5 cannot be added to members without CAN_ADD");
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.handle(), Some(Handle(5)));
    }

    #[test]
    fn test_handle_accessor() {
        assert_eq!(GroupError::NoChannelSpecificHandles.handle(), None);
        assert_eq!(
            GroupError::OwnerAlreadySet { local: Handle(10), owner: Handle(20) }.handle(),
            Some(Handle(10))
        );
    }
}
