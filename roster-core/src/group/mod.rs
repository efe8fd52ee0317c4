//! Group membership for multi-party channels
//!
//! This module tracks who is in a channel and who is waiting to be let in.
//!
//! ## Architecture
//!
//! - **GroupMembership**: the three disjoint sets (members, local-pending,
//!   remote-pending) and the transition engine that moves handles between them
//! - **PendingLedger**: actor/reason/message for each local-pending handle
//! - **OwnerMap**: owners of channel-specific handles
//! - **GroupFlags**: which transitions the channel currently permits
//! - **MemberPolicy**: the channel's decision for each add/remove request
//!
//! Every transition that changes something emits exactly one
//! [`GroupEvent::MembersChanged`] with the net deltas.

mod change;
mod error;
mod flags;
mod membership;
mod observer;
mod owners;
mod pending;
mod policy;
mod reason;

pub use change::{GroupEvent, MembersChanged, MembershipChange};
pub use error::{ErrorKind, GroupError};
pub use flags::{apply_flags_change, FlagsChange, GroupFlags};
pub use membership::GroupMembership;
pub use observer::{ChannelObserver, DiffLogger, GroupObserver};
pub use owners::OwnerMap;
pub use pending::{LocalPendingEntry, LocalPendingInfo, PendingLedger};
pub use policy::{DirectPolicy, InvitePolicy, MemberPolicy};
pub use reason::ChangeReason;
