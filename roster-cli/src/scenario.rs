//! TOML-described membership scenarios
//!
//! A scenario names its contacts, picks a policy and lists steps that are
//! applied in order to a fresh group. Every event the group emits is written
//! as one JSON line; a failing step is reported and the replay moves on.
//!
//! ```toml
//! contacts = ["alice", "bob", "carol"]
//! self = "alice"
//! flags = "CAN_ADD | CAN_REMOVE"
//! policy = "invite"
//!
//! [[steps]]
//! op = "add"
//! handles = ["bob"]
//! message = "hi"
//! ```

use anyhow::{anyhow, Context, Result};
use roster_core::config::GroupConfig;
use roster_core::group::{
    ChangeReason, ChannelObserver, DirectPolicy, GroupEvent, GroupFlags, GroupMembership,
    InvitePolicy, MemberPolicy, MembershipChange,
};
use roster_core::handles::{Handle, MemoryHandleRepo};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Registered in order, so the first contact gets handle 1
    pub contacts: Vec<String>,

    /// Contact acting as the local party; falls back to the configured handle
    #[serde(default, rename = "self")]
    pub self_contact: Option<String>,

    /// Initial flags; falls back to the configured flags
    #[serde(default)]
    pub flags: Option<GroupFlags>,

    #[serde(default)]
    pub policy: PolicyKind,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    #[default]
    Direct,
    Invite,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Add {
        handles: Vec<String>,
        #[serde(default)]
        message: String,
    },
    Remove {
        handles: Vec<String>,
        #[serde(default)]
        message: String,
    },
    ChangeFlags {
        #[serde(default)]
        add: GroupFlags,
        #[serde(default)]
        remove: GroupFlags,
    },
    ChangeMembers {
        #[serde(default)]
        add: Vec<String>,
        #[serde(default)]
        remove: Vec<String>,
        #[serde(default)]
        local_pending: Vec<String>,
        #[serde(default)]
        remote_pending: Vec<String>,
        #[serde(default)]
        actor: Option<String>,
        #[serde(default)]
        reason: ChangeReason,
        #[serde(default)]
        message: String,
    },
    SetOwner {
        local: String,
        owner: String,
    },
    ClearOwner {
        local: String,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Add { .. } => "add",
            Step::Remove { .. } => "remove",
            Step::ChangeFlags { .. } => "change-flags",
            Step::ChangeMembers { .. } => "change-members",
            Step::SetOwner { .. } => "set-owner",
            Step::ClearOwner { .. } => "clear-owner",
        }
    }
}

/// Outcome of a replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub failed: usize,
    pub events: usize,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// A group built from a scenario, ready to run its steps
pub struct Replay {
    repo: Arc<MemoryHandleRepo>,
    group: GroupMembership,
    policy: Box<dyn MemberPolicy>,
    events: UnboundedReceiver<GroupEvent>,
}

impl Replay {
    pub fn new(scenario: &Scenario, defaults: &GroupConfig) -> Result<Self> {
        let repo = Arc::new(MemoryHandleRepo::new());
        for name in &scenario.contacts {
            repo.ensure(name);
        }

        let self_handle = match &scenario.self_contact {
            Some(name) => resolve(&repo, name)?.as_u32(),
            None => defaults.self_handle,
        };
        let config = GroupConfig {
            self_handle,
            flags: scenario.flags.unwrap_or(defaults.flags),
            log_diffs: defaults.log_diffs,
        };

        let mut group = GroupMembership::from_config(repo.clone(), &config)?;
        let (observer, events) = ChannelObserver::pair();
        group.subscribe(observer);

        let policy: Box<dyn MemberPolicy> = match scenario.policy {
            PolicyKind::Direct => Box::new(DirectPolicy),
            PolicyKind::Invite => Box::new(InvitePolicy),
        };

        Ok(Self { repo, group, policy, events })
    }

    pub fn group(&self) -> &GroupMembership {
        &self.group
    }

    /// Run every step, writing emitted events to `out` as JSON lines
    pub fn run(&mut self, steps: &[Step], out: &mut impl Write) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();

        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            summary.steps += 1;

            if let Err(err) = self.apply(step) {
                summary.failed += 1;
                warn!(step = number, op = step.name(), error = %err, "step failed");
                eprintln!("step {} ({}): {}", number, step.name(), err);
            }

            while let Ok(event) = self.events.try_recv() {
                serde_json::to_writer(&mut *out, &event)?;
                writeln!(out)?;
                summary.events += 1;
            }
        }

        info!(
            steps = summary.steps,
            failed = summary.failed,
            events = summary.events,
            members = self.group.members().len(),
            "replay finished"
        );
        Ok(summary)
    }

    fn apply(&mut self, step: &Step) -> Result<()> {
        debug!(op = step.name(), "applying step");
        match step {
            Step::Add { handles, message } => {
                let handles = self.resolve_all(handles)?;
                self.group.request_add(self.policy.as_mut(), &handles, message)?;
            }
            Step::Remove { handles, message } => {
                let handles = self.resolve_all(handles)?;
                self.group.request_remove(self.policy.as_mut(), &handles, message)?;
            }
            Step::ChangeFlags { add, remove } => {
                self.group.change_flags(*add, *remove);
            }
            Step::ChangeMembers {
                add,
                remove,
                local_pending,
                remote_pending,
                actor,
                reason,
                message,
            } => {
                let actor = match actor {
                    Some(name) => resolve(&self.repo, name)?,
                    None => Handle::NONE,
                };
                let change = MembershipChange::new()
                    .add(self.resolve_all(add)?)
                    .remove(self.resolve_all(remove)?)
                    .local_pending(self.resolve_all(local_pending)?)
                    .remote_pending(self.resolve_all(remote_pending)?)
                    .actor(actor)
                    .reason(*reason)
                    .message(message.as_str());
                if !self.group.try_change_members(change)? {
                    debug!("step changed nothing");
                }
            }
            Step::SetOwner { local, owner } => {
                let local = resolve(&self.repo, local)?;
                let owner = resolve(&self.repo, owner)?;
                self.group.set_owner(local, owner)?;
            }
            Step::ClearOwner { local } => {
                let local = resolve(&self.repo, local)?;
                if self.group.clear_owner(local).is_none() {
                    debug!(%local, "no owner to clear");
                }
            }
        }
        Ok(())
    }

    fn resolve_all(&self, names: &[String]) -> Result<Vec<Handle>> {
        names.iter().map(|name| resolve(&self.repo, name)).collect()
    }
}

fn resolve(repo: &MemoryHandleRepo, name: &str) -> Result<Handle> {
    repo.lookup(name).ok_or_else(|| anyhow!("unknown contact `{}`", name))
}
