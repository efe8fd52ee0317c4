//! Metrics for membership activity
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register descriptions for every metric this crate records
pub fn init_metrics() {
    describe_counter!("group.members_changed", "Membership transitions that emitted a change");
    describe_counter!("group.flags_changed", "Group flag changes that toggled at least one bit");
    describe_counter!("group.requests.denied", "Add/remove requests refused by the flag checks");
    describe_gauge!("group.members.size", "Members in the most recently changed group");
}

/// Record a counter metric
pub fn record_counter(name: &'static str, value: u64) {
    counter!(name).increment(value);
}

/// Record a gauge metric
pub fn record_gauge(name: &'static str, value: f64) {
    gauge!(name).set(value);
}
