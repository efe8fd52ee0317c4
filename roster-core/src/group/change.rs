//! Change requests and the notifications they produce

use super::{ChangeReason, FlagsChange, GroupFlags};
use crate::handles::Handle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A requested four-way membership update.
///
/// The candidate sets may overlap; [`GroupMembership::change_members`]
/// resolves overlaps with remove > members > local-pending > remote-pending.
///
/// [`GroupMembership::change_members`]: super::GroupMembership::change_members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipChange {
    pub add: BTreeSet<Handle>,
    pub remove: BTreeSet<Handle>,
    pub local_pending: BTreeSet<Handle>,
    pub remote_pending: BTreeSet<Handle>,
    pub actor: Handle,
    pub reason: ChangeReason,
    pub message: String,
}

impl MembershipChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, handles: impl IntoIterator<Item = Handle>) -> Self {
        self.add.extend(handles);
        self
    }

    pub fn remove(mut self, handles: impl IntoIterator<Item = Handle>) -> Self {
        self.remove.extend(handles);
        self
    }

    pub fn local_pending(mut self, handles: impl IntoIterator<Item = Handle>) -> Self {
        self.local_pending.extend(handles);
        self
    }

    pub fn remote_pending(mut self, handles: impl IntoIterator<Item = Handle>) -> Self {
        self.remote_pending.extend(handles);
        self
    }

    pub fn actor(mut self, actor: Handle) -> Self {
        self.actor = actor;
        self
    }

    pub fn reason(mut self, reason: ChangeReason) -> Self {
        self.reason = reason;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// True when all four candidate sets are empty
    pub fn is_empty(&self) -> bool {
        self.add.is_empty()
            && self.remove.is_empty()
            && self.local_pending.is_empty()
            && self.remote_pending.is_empty()
    }

    /// Every handle named by the change, including the actor
    pub fn handles(&self) -> Vec<Handle> {
        let mut all: BTreeSet<Handle> = BTreeSet::new();
        all.extend(&self.add);
        all.extend(&self.remove);
        all.extend(&self.local_pending);
        all.extend(&self.remote_pending);
        if !self.actor.is_none() {
            all.insert(self.actor);
        }
        all.into_iter().collect()
    }
}

/// Net effect of one membership transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersChanged {
    pub message: String,
    pub added: BTreeSet<Handle>,
    pub removed: BTreeSet<Handle>,
    pub local_pending: BTreeSet<Handle>,
    pub remote_pending: BTreeSet<Handle>,
    pub actor: Handle,
    pub reason: ChangeReason,
}

impl MembersChanged {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.local_pending.is_empty()
            && self.remote_pending.is_empty()
    }
}

/// Notifications emitted by a [`GroupMembership`](super::GroupMembership)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GroupEvent {
    MembersChanged(MembersChanged),
    FlagsChanged { added: GroupFlags, removed: GroupFlags },
}

impl From<MembersChanged> for GroupEvent {
    fn from(change: MembersChanged) -> Self {
        GroupEvent::MembersChanged(change)
    }
}

impl From<FlagsChange> for GroupEvent {
    fn from(change: FlagsChange) -> Self {
        GroupEvent::FlagsChanged { added: change.added, removed: change.removed }
    }
}
