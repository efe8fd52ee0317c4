//! The group membership state machine
//!
//! [`GroupMembership`] holds the three disjoint member sets of a channel,
//! the provenance of every local-pending handle, the owner map for
//! channel-specific handles and the set of actors seen so far. Every
//! mutation runs to completion inside one `&mut self` call, so callers never
//! observe an intermediate state.

use super::flags::apply_flags_change;
use super::{
    DiffLogger, FlagsChange, GroupError, GroupEvent, GroupFlags, GroupObserver,
    LocalPendingEntry, LocalPendingInfo, MemberPolicy, MembersChanged, MembershipChange,
    OwnerMap, PendingLedger,
};
use crate::config::GroupConfig;
use crate::handles::{Handle, HandleRef, HandleRepo, HandleSet};
use crate::metrics::{record_counter, record_gauge};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span};

pub struct GroupMembership {
    repo: Arc<dyn HandleRepo>,
    self_handle: HandleRef,
    flags: GroupFlags,

    members: HandleSet,
    local_pending: HandleSet,
    remote_pending: HandleSet,

    pending_info: PendingLedger,
    owners: OwnerMap,
    actors: HandleSet,

    observers: Vec<Box<dyn GroupObserver>>,
}

impl GroupMembership {
    /// Create an empty group with no flags set.
    ///
    /// `self_handle` may be `Handle::NONE` when the local party has no
    /// handle on this channel.
    pub fn new(repo: Arc<dyn HandleRepo>, self_handle: Handle) -> Self {
        Self {
            self_handle: HandleRef::new(Arc::clone(&repo), self_handle),
            flags: GroupFlags::empty(),
            members: HandleSet::new(Arc::clone(&repo)),
            local_pending: HandleSet::new(Arc::clone(&repo)),
            remote_pending: HandleSet::new(Arc::clone(&repo)),
            pending_info: PendingLedger::new(),
            owners: OwnerMap::new(Arc::clone(&repo)),
            actors: HandleSet::new(Arc::clone(&repo)),
            observers: Vec::new(),
            repo,
        }
    }

    /// Create a group from configuration, validating the self handle
    pub fn from_config(repo: Arc<dyn HandleRepo>, config: &GroupConfig) -> Result<Self, GroupError> {
        let self_handle = Handle(config.self_handle);
        if !self_handle.is_none() {
            repo.validate_all(&[self_handle])?;
        }

        let mut group = Self::new(Arc::clone(&repo), self_handle);
        group.flags = config.flags;
        if config.log_diffs {
            group.subscribe(DiffLogger::new(repo));
        }
        Ok(group)
    }

    /// Register an observer for every subsequent event
    pub fn subscribe(&mut self, observer: impl GroupObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn repo(&self) -> &Arc<dyn HandleRepo> {
        &self.repo
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn self_handle(&self) -> Handle {
        self.self_handle.handle()
    }

    pub fn flags(&self) -> GroupFlags {
        self.flags
    }

    pub fn members(&self) -> BTreeSet<Handle> {
        self.members.to_set()
    }

    pub fn local_pending(&self) -> BTreeSet<Handle> {
        self.local_pending.to_set()
    }

    pub fn remote_pending(&self) -> BTreeSet<Handle> {
        self.remote_pending.to_set()
    }

    /// Members, local-pending and remote-pending, in that order
    pub fn all_members(&self) -> (BTreeSet<Handle>, BTreeSet<Handle>, BTreeSet<Handle>) {
        (self.members(), self.local_pending(), self.remote_pending())
    }

    pub fn is_member(&self, handle: Handle) -> bool {
        self.members.contains(handle)
    }

    pub fn is_local_pending(&self, handle: Handle) -> bool {
        self.local_pending.contains(handle)
    }

    pub fn is_remote_pending(&self, handle: Handle) -> bool {
        self.remote_pending.contains(handle)
    }

    pub fn local_pending_with_info(&self) -> Vec<LocalPendingEntry> {
        self.pending_info.entries()
    }

    pub fn local_pending_info(&self, handle: Handle) -> Option<&LocalPendingInfo> {
        self.pending_info.get(handle)
    }

    /// Every handle that has ever been credited with a change
    pub fn actors(&self) -> BTreeSet<Handle> {
        self.actors.to_set()
    }

    pub fn display_name(&self, handle: Handle) -> Option<String> {
        self.repo.inspect(handle)
    }

    /// Current owner mappings, local handle → owner
    pub fn owner_map(&self) -> BTreeMap<Handle, Handle> {
        self.owners.entries()
    }

    // ------------------------------------------------------------------
    // Owner map
    // ------------------------------------------------------------------

    /// Resolve channel-specific handles to their owners.
    ///
    /// Members without a recorded owner resolve to `Handle::NONE`.
    pub fn handle_owners(&self, handles: &[Handle]) -> Result<Vec<Handle>, GroupError> {
        if !self.flags.contains(GroupFlags::CHANNEL_SPECIFIC_HANDLES) {
            return Err(GroupError::NoChannelSpecificHandles);
        }
        self.repo.validate_all(handles)?;

        handles
            .iter()
            .map(|h| {
                if !self.members.contains(*h) {
                    return Err(GroupError::NotAMember(*h));
                }
                Ok(self.owners.owner_of(*h).unwrap_or(Handle::NONE))
            })
            .collect()
    }

    /// Record the owner of a channel-specific handle.
    ///
    /// Fails with `OwnerAlreadySet` if `local` is already mapped; call
    /// [`clear_owner`](Self::clear_owner) first to replace a mapping.
    pub fn set_owner(&mut self, local: Handle, owner: Handle) -> Result<(), GroupError> {
        self.repo.validate_all(&[local, owner])?;
        self.owners.set_owner(local, owner)
    }

    pub fn clear_owner(&mut self, local: Handle) -> Option<Handle> {
        self.owners.clear_owner(local)
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    /// Set and clear group flags, emitting `FlagsChanged` if any bit moved
    pub fn change_flags(&mut self, add: GroupFlags, remove: GroupFlags) -> FlagsChange {
        let (next, change) = apply_flags_change(self.flags, add, remove);
        self.flags = next;

        if change.is_empty() {
            debug!(flags = %self.flags, "flags unchanged, not emitting");
            return change;
        }

        debug!(
            added = %change.added.bracketed(),
            removed = %change.removed.bracketed(),
            now = %self.flags.bracketed(),
            "group flags changed"
        );
        record_counter("group.flags_changed", 1);
        self.emit(GroupEvent::from(change));
        change
    }

    // ------------------------------------------------------------------
    // Requests from the RPC layer
    // ------------------------------------------------------------------

    /// Handle an add request.
    ///
    /// Every handle is validated and checked against the flags before the
    /// policy is consulted; handles that are already members are skipped.
    /// The plans are applied only once the policy has accepted them all.
    pub fn request_add(
        &mut self,
        policy: &mut dyn MemberPolicy,
        handles: &[Handle],
        message: &str,
    ) -> Result<(), GroupError> {
        let _span = debug_span!("request_add", count = handles.len()).entered();
        self.repo.validate_all(handles)?;

        for &handle in handles {
            if !self.flags.contains(GroupFlags::CAN_ADD) && !self.local_pending.contains(handle) {
                debug!(%handle, "cannot be added to members without CAN_ADD");
                return Err(self.denied(handle, "added to members", GroupFlags::CAN_ADD));
            }
        }

        let mut seen = BTreeSet::new();
        let mut plans = Vec::with_capacity(handles.len());
        for &handle in handles {
            if !seen.insert(handle) {
                continue;
            }
            if self.members.contains(handle) {
                debug!(%handle, "already a member, skipping");
                continue;
            }
            plans.push(policy.add_member(self, handle, message)?);
        }

        self.apply_plans(plans);
        Ok(())
    }

    /// Handle a remove request.
    ///
    /// Removing a member needs `CAN_REMOVE`, rescinding a remote-pending
    /// invitation needs `CAN_RESCIND`, rejecting a local-pending one is
    /// always allowed. Handles in none of the sets fail the batch.
    pub fn request_remove(
        &mut self,
        policy: &mut dyn MemberPolicy,
        handles: &[Handle],
        message: &str,
    ) -> Result<(), GroupError> {
        let _span = debug_span!("request_remove", count = handles.len()).entered();
        self.repo.validate_all(handles)?;

        for &handle in handles {
            if self.members.contains(handle) {
                if !self.flags.contains(GroupFlags::CAN_REMOVE) {
                    debug!(%handle, "cannot be removed from members without CAN_REMOVE");
                    return Err(self.denied(handle, "removed from members", GroupFlags::CAN_REMOVE));
                }
            } else if self.remote_pending.contains(handle) {
                if !self.flags.contains(GroupFlags::CAN_RESCIND) {
                    debug!(%handle, "cannot be removed from remote pending without CAN_RESCIND");
                    return Err(self.denied(
                        handle,
                        "removed from remote pending",
                        GroupFlags::CAN_RESCIND,
                    ));
                }
            } else if !self.local_pending.contains(handle) {
                debug!(%handle, "not a current or pending member");
                record_counter("group.requests.denied", 1);
                return Err(GroupError::NotCurrentOrPending(handle));
            }
        }

        let mut seen = BTreeSet::new();
        let mut plans = Vec::with_capacity(handles.len());
        for &handle in handles {
            if seen.insert(handle) {
                plans.push(policy.remove_member(self, handle, message)?);
            }
        }

        self.apply_plans(plans);
        Ok(())
    }

    fn denied(&self, handle: Handle, operation: &'static str, required: GroupFlags) -> GroupError {
        record_counter("group.requests.denied", 1);
        GroupError::PermissionDenied { handle, operation, required }
    }

    fn apply_plans(&mut self, plans: Vec<MembershipChange>) {
        for plan in plans {
            self.change_members(plan);
        }
    }

    // ------------------------------------------------------------------
    // Transition engine
    // ------------------------------------------------------------------

    /// Like [`change_members`](Self::change_members), but rejects changes
    /// naming handles the registry does not know.
    pub fn try_change_members(&mut self, change: MembershipChange) -> Result<bool, GroupError> {
        self.repo.validate_all(&change.handles())?;
        Ok(self.change_members(change))
    }

    /// Apply a four-way membership update and report whether anything changed.
    ///
    /// Emits exactly one `MembersChanged` carrying the net deltas when the
    /// update is non-trivial, and nothing otherwise.
    pub fn change_members(&mut self, change: MembershipChange) -> bool {
        let MembershipChange {
            add,
            remove,
            mut local_pending,
            mut remote_pending,
            actor,
            reason,
            message,
        } = change;

        // Overlapping candidates: members beats local-pending beats remote-pending.
        local_pending.retain(|h| !add.contains(h));
        remote_pending.retain(|h| !add.contains(h) && !local_pending.contains(h));

        // members
        let added = self.members.update(&add);
        let mut removed = self.members.difference_update(&remove);
        self.members.difference_update(&local_pending);
        self.members.difference_update(&remote_pending);

        // local pending
        let new_local = self.local_pending.update(&local_pending);
        for handle in &new_local {
            let info = LocalPendingInfo::new(&self.repo, actor, reason, &message);
            self.pending_info.insert(*handle, info);
        }
        self.drop_local_pending(&add);
        removed.extend(self.drop_local_pending(&remove));
        self.drop_local_pending(&remote_pending);

        // remote pending
        let new_remote = self.remote_pending.update(&remote_pending);
        self.remote_pending.difference_update(&add);
        removed.extend(self.remote_pending.difference_update(&remove));
        self.remote_pending.difference_update(&local_pending);

        let event = MembersChanged {
            message,
            added,
            removed,
            local_pending: new_local,
            remote_pending: new_remote,
            actor,
            reason,
        };

        if event.is_empty() {
            debug!("not emitting members changed, nothing changed");
            return false;
        }

        let dropped_owners = self.owners.remove_all(&event.removed);
        if dropped_owners > 0 {
            debug!(count = dropped_owners, "dropped owner mappings of removed handles");
        }

        if !actor.is_none() {
            self.actors.insert(actor);
        }

        debug!(
            added = event.added.len(),
            removed = event.removed.len(),
            local_pending = event.local_pending.len(),
            remote_pending = event.remote_pending.len(),
            %actor,
            %reason,
            "members changed"
        );
        record_counter("group.members_changed", 1);
        record_gauge("group.members.size", self.members.len() as f64);

        self.emit(GroupEvent::from(event));
        true
    }

    /// Remove handles from local-pending together with their provenance
    fn drop_local_pending(&mut self, handles: &BTreeSet<Handle>) -> BTreeSet<Handle> {
        let dropped = self.local_pending.difference_update(handles);
        for handle in &dropped {
            self.pending_info.remove(*handle);
        }
        dropped
    }

    fn emit(&mut self, event: GroupEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}

impl fmt::Debug for GroupMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupMembership")
            .field("self_handle", &self.self_handle())
            .field("flags", &self.flags)
            .field("members", &self.members)
            .field("local_pending", &self.local_pending)
            .field("remote_pending", &self.remote_pending)
            .field("owners", &self.owners)
            .field("observers", &self.observers.len())
            .finish()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::handles::MemoryHandleRepo;
    use crate::test_utils::{assert_group_invariants, EventLog};
    use proptest::prelude::*;

    fn handles() -> impl Strategy<Value = BTreeSet<Handle>> {
        prop::collection::btree_set((1u32..=8).prop_map(Handle), 0..4)
    }

    fn change() -> impl Strategy<Value = MembershipChange> {
        (handles(), handles(), handles(), handles(), 0u32..=8).prop_map(
            |(add, remove, local_pending, remote_pending, actor)| MembershipChange {
                add,
                remove,
                local_pending,
                remote_pending,
                actor: Handle(actor),
                ..Default::default()
            },
        )
    }

    proptest! {
        // Sets stay disjoint, the ledger tracks local-pending exactly, and
        // every stored handle holds exactly one reference per slot.
        #[test]
        fn prop_invariants_hold(changes in prop::collection::vec(change(), 1..12)) {
            let repo = Arc::new(MemoryHandleRepo::new());
            for i in 1..=8 {
                repo.ensure(&format!("c{}", i));
            }
            let mut group = GroupMembership::new(repo.clone(), Handle(1));

            for change in changes {
                group.change_members(change);
                assert_group_invariants(&group, &repo);
            }

            drop(group);
            prop_assert_eq!(repo.outstanding(), 0);
        }

        // A change reports something iff it emits exactly one event.
        #[test]
        fn prop_one_event_per_change(changes in prop::collection::vec(change(), 1..12)) {
            let repo = Arc::new(MemoryHandleRepo::new());
            for i in 1..=8 {
                repo.ensure(&format!("c{}", i));
            }
            let mut group = GroupMembership::new(repo.clone(), Handle::NONE);
            let events = EventLog::new();
            group.subscribe(events.observer());

            let mut expected = 0;
            for change in changes {
                if group.change_members(change) {
                    expected += 1;
                }
                prop_assert_eq!(events.len(), expected);
            }
        }

        // Net deltas describe the transition: added handles are members now,
        // removed ones are in no set.
        #[test]
        fn prop_net_deltas_consistent(first in change(), second in change()) {
            let repo = Arc::new(MemoryHandleRepo::new());
            for i in 1..=8 {
                repo.ensure(&format!("c{}", i));
            }
            let mut group = GroupMembership::new(repo.clone(), Handle::NONE);
            let events = EventLog::new();
            group.subscribe(events.observer());

            group.change_members(first);
            let before = group.members();
            let remove = second.remove.clone();
            if group.change_members(second) {
                let last = events.members_changes().pop().unwrap();
                for h in &last.added {
                    prop_assert!(!before.contains(h));
                }
                for h in &last.removed {
                    prop_assert!(remove.contains(h));
                    prop_assert!(!group.is_member(*h));
                    prop_assert!(!group.is_local_pending(*h));
                    prop_assert!(!group.is_remote_pending(*h));
                }
            }
        }
    }
}
