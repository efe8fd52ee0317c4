//! Test utilities and helpers for roster
//!
//! Shared by the unit tests, the integration tests under `tests/` and the
//! CLI tests: a registry pre-populated with named contacts, an observer that
//! records every event, and assertions for the group invariants.

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
