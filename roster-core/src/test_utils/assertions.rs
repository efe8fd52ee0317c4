//! Assertions over the observable state of a group

use crate::group::GroupMembership;
use crate::handles::{Handle, MemoryHandleRepo};
use std::collections::{BTreeMap, BTreeSet};

/// Check the structural invariants of a group.
///
/// - members, local-pending and remote-pending are pairwise disjoint
/// - the pending ledger has an entry for exactly the local-pending handles
/// - every handle holds one registry reference per slot that stores it,
///   and nothing else holds references (`repo` must back only this group)
#[track_caller]
pub fn assert_group_invariants(group: &GroupMembership, repo: &MemoryHandleRepo) {
    let (members, local, remote) = group.all_members();

    assert_disjoint("members", &members, "local_pending", &local);
    assert_disjoint("members", &members, "remote_pending", &remote);
    assert_disjoint("local_pending", &local, "remote_pending", &remote);

    let entries = group.local_pending_with_info();
    let ledger: BTreeSet<Handle> = entries.iter().map(|e| e.handle).collect();
    assert_eq!(ledger, local, "pending ledger out of sync with local_pending");

    let mut expected: BTreeMap<Handle, usize> = BTreeMap::new();
    let mut hold = |handle: Handle| {
        if !handle.is_none() {
            *expected.entry(handle).or_default() += 1;
        }
    };

    hold(group.self_handle());
    members.iter().chain(&local).chain(&remote).copied().for_each(&mut hold);
    group.actors().into_iter().for_each(&mut hold);
    entries.iter().map(|e| e.actor).for_each(&mut hold);
    for (local_handle, owner) in group.owner_map() {
        hold(local_handle);
        hold(owner);
    }

    for (handle, count) in &expected {
        assert_eq!(
            repo.refcount(*handle),
            *count,
            "handle {} should hold {} references",
            handle,
            count
        );
    }
    assert_eq!(
        repo.outstanding(),
        expected.values().sum::<usize>(),
        "references held outside the group"
    );
}

/// Assert that two handle sets share nothing
#[track_caller]
pub fn assert_disjoint(a_name: &str, a: &BTreeSet<Handle>, b_name: &str, b: &BTreeSet<Handle>) {
    let shared: Vec<_> = a.intersection(b).collect();
    assert!(shared.is_empty(), "{} and {} share {:?}", a_name, b_name, shared);
}
