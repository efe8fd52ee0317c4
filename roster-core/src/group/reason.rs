//! Reason codes attached to membership changes

use super::GroupError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a membership change happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    #[default]
    None,
    Offline,
    Kicked,
    Busy,
    Invited,
    Banned,
}

impl ChangeReason {
    pub fn as_u32(self) -> u32 {
        match self {
            ChangeReason::None => 0,
            ChangeReason::Offline => 1,
            ChangeReason::Kicked => 2,
            ChangeReason::Busy => 3,
            ChangeReason::Invited => 4,
            ChangeReason::Banned => 5,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ChangeReason::None => "unspecified reason",
            ChangeReason::Offline => "offline",
            ChangeReason::Kicked => "kicked",
            ChangeReason::Busy => "busy",
            ChangeReason::Invited => "invited",
            ChangeReason::Banned => "banned",
        }
    }
}

impl TryFrom<u32> for ChangeReason {
    type Error = GroupError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ChangeReason::None),
            1 => Ok(ChangeReason::Offline),
            2 => Ok(ChangeReason::Kicked),
            3 => Ok(ChangeReason::Busy),
            4 => Ok(ChangeReason::Invited),
            5 => Ok(ChangeReason::Banned),
            other => Err(GroupError::InvalidReason(other)),
        }
    }
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_u32(), self.description())
    }
}
