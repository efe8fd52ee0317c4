//! Channel-supplied add/remove policies
//!
//! The membership core validates a request against the group flags and then
//! asks the channel's [`MemberPolicy`] how each handle should move. The
//! policy only *plans* the transition; nothing is applied until every handle
//! in the batch has been accepted.

use super::{ChangeReason, GroupError, GroupMembership, MembershipChange};
use crate::handles::Handle;

pub trait MemberPolicy {
    /// Plan the transition for one handle of an add request
    fn add_member(
        &mut self,
        group: &GroupMembership,
        handle: Handle,
        message: &str,
    ) -> Result<MembershipChange, GroupError>;

    /// Plan the transition for one handle of a remove request
    fn remove_member(
        &mut self,
        group: &GroupMembership,
        handle: Handle,
        message: &str,
    ) -> Result<MembershipChange, GroupError>;
}

/// Adds and removes members immediately, crediting the local party
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectPolicy;

impl MemberPolicy for DirectPolicy {
    fn add_member(
        &mut self,
        group: &GroupMembership,
        handle: Handle,
        message: &str,
    ) -> Result<MembershipChange, GroupError> {
        Ok(MembershipChange::new()
            .add([handle])
            .actor(group.self_handle())
            .message(message))
    }

    fn remove_member(
        &mut self,
        group: &GroupMembership,
        handle: Handle,
        message: &str,
    ) -> Result<MembershipChange, GroupError> {
        Ok(MembershipChange::new()
            .remove([handle])
            .actor(group.self_handle())
            .message(message))
    }
}

/// Invitation-style rooms: adding someone sends an invite (remote-pending),
/// adding a local-pending handle accepts its invitation.
#[derive(Debug, Default, Clone, Copy)]
pub struct InvitePolicy;

impl MemberPolicy for InvitePolicy {
    fn add_member(
        &mut self,
        group: &GroupMembership,
        handle: Handle,
        message: &str,
    ) -> Result<MembershipChange, GroupError> {
        let change = MembershipChange::new().actor(group.self_handle()).message(message);

        if group.is_local_pending(handle) {
            return Ok(change.add([handle]));
        }

        Ok(change.remote_pending([handle]).reason(ChangeReason::Invited))
    }

    fn remove_member(
        &mut self,
        group: &GroupMembership,
        handle: Handle,
        message: &str,
    ) -> Result<MembershipChange, GroupError> {
        Ok(MembershipChange::new()
            .remove([handle])
            .actor(group.self_handle())
            .message(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handles::MemoryHandleRepo;
    use std::sync::Arc;

    fn group() -> (Arc<MemoryHandleRepo>, GroupMembership, Handle, Handle) {
        let repo = Arc::new(MemoryHandleRepo::new());
        let me = repo.ensure("me");
        let friend = repo.ensure("friend");
        let group = GroupMembership::new(repo.clone(), me);
        (repo, group, me, friend)
    }

    #[test]
    fn test_direct_policy_plans() {
        let (_repo, group, me, friend) = group();
        let mut policy = DirectPolicy;

        let add = policy.add_member(&group, friend, "hi").unwrap();
        assert!(add.add.contains(&friend));
        assert_eq!(add.actor, me);
        assert_eq!(add.message, "hi");

        let remove = policy.remove_member(&group, friend, "bye").unwrap();
        assert!(remove.remove.contains(&friend));
    }

    #[test]
    fn test_invite_policy_invites_strangers() {
        let (_repo, group, me, friend) = group();
        let mut policy = InvitePolicy;

        let plan = policy.add_member(&group, friend, "").unwrap();
        assert!(plan.remote_pending.contains(&friend));
        assert!(plan.add.is_empty());
        assert_eq!(plan.reason, ChangeReason::Invited);
        assert_eq!(plan.actor, me);
    }

    #[test]
    fn test_invite_policy_accepts_local_pending() {
        let (_repo, mut group, me, _friend) = group();
        group.change_members(MembershipChange::new().local_pending([me]));

        let plan = InvitePolicy.add_member(&group, me, "").unwrap();
        assert!(plan.add.contains(&me));
        assert!(plan.remote_pending.is_empty());
    }
}
