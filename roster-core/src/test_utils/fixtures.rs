//! Test fixtures for building groups and recording their events

use crate::group::{GroupEvent, GroupObserver, MembersChanged};
use crate::handles::{Handle, MemoryHandleRepo};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Registry holding `contact1..=contactN`, which get handles `1..=N`
pub fn contacts(n: u32) -> Arc<MemoryHandleRepo> {
    let repo = Arc::new(MemoryHandleRepo::new());
    for i in 1..=n {
        repo.ensure(&format!("contact{}", i));
    }
    repo
}

/// Handle set from raw ids
pub fn set(ids: &[u32]) -> BTreeSet<Handle> {
    ids.iter().copied().map(Handle).collect()
}

/// Records every event delivered to the observers it hands out
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<GroupEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer appending to this log; subscribe it to a group
    pub fn observer(&self) -> impl GroupObserver + 'static {
        let events = Arc::clone(&self.events);
        move |event: &GroupEvent| {
            events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
        }
    }

    pub fn all(&self) -> Vec<GroupEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Only the `MembersChanged` payloads, in order
    pub fn members_changes(&self) -> Vec<MembersChanged> {
        self.all()
            .into_iter()
            .filter_map(|event| match event {
                GroupEvent::MembersChanged(change) => Some(change),
                GroupEvent::FlagsChanged { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
