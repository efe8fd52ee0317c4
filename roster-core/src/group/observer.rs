//! Notification sinks for membership events

use super::GroupEvent;
use crate::handles::{Handle, HandleRepo};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Receives every event a group emits, in emission order
pub trait GroupObserver: Send {
    fn on_event(&mut self, event: &GroupEvent);
}

impl<F> GroupObserver for F
where
    F: FnMut(&GroupEvent) + Send,
{
    fn on_event(&mut self, event: &GroupEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded tokio channel
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<GroupEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<GroupEvent>) -> Self {
        Self { tx }
    }

    /// Create an observer together with the receiving half
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<GroupEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl GroupObserver for ChannelObserver {
    fn on_event(&mut self, event: &GroupEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!("group event receiver dropped, discarding event");
        }
    }
}

/// Logs a human-readable dump of each event, resolving display names
pub struct DiffLogger {
    repo: Arc<dyn HandleRepo>,
}

impl DiffLogger {
    pub fn new(repo: Arc<dyn HandleRepo>) -> Self {
        Self { repo }
    }

    /// Render a handle set as `[1 (alice), 2 (bob)]`
    pub fn describe(&self, handles: &BTreeSet<Handle>) -> String {
        let parts: Vec<String> = handles
            .iter()
            .map(|h| {
                let name = self.repo.inspect(*h).unwrap_or_else(|| "?".to_string());
                format!("{} ({})", h, name)
            })
            .collect();
        format!("[{}]", parts.join(", "))
    }
}

impl GroupObserver for DiffLogger {
    fn on_event(&mut self, event: &GroupEvent) {
        match event {
            GroupEvent::MembersChanged(change) => {
                info!(
                    message = %change.message,
                    added = %self.describe(&change.added),
                    removed = %self.describe(&change.removed),
                    local_pending = %self.describe(&change.local_pending),
                    remote_pending = %self.describe(&change.remote_pending),
                    actor = %change.actor,
                    reason = %change.reason,
                    "emitting members changed"
                );
            }
            GroupEvent::FlagsChanged { added, removed } => {
                info!(
                    added = %added.bracketed(),
                    removed = %removed.bracketed(),
                    "emitting group flags changed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{GroupFlags, MembersChanged};
    use crate::handles::MemoryHandleRepo;

    fn flags_event() -> GroupEvent {
        GroupEvent::FlagsChanged { added: GroupFlags::CAN_ADD, removed: GroupFlags::empty() }
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |event: &GroupEvent| seen.push(event.clone());
            observer.on_event(&flags_event());
        }
        assert_eq!(seen, vec![flags_event()]);
    }

    #[tokio::test]
    async fn test_channel_observer_forwards() {
        let (mut observer, mut rx) = ChannelObserver::pair();
        observer.on_event(&flags_event());
        assert_eq!(rx.recv().await, Some(flags_event()));
    }

    #[test]
    fn test_channel_observer_tolerates_closed_receiver() {
        let (mut observer, rx) = ChannelObserver::pair();
        drop(rx);
        observer.on_event(&flags_event());
    }

    #[test]
    fn test_diff_logger_describe() {
        let repo = Arc::new(MemoryHandleRepo::new());
        let alice = repo.ensure("alice");
        let bob = repo.ensure("bob");
        let logger = DiffLogger::new(repo);

        let set: BTreeSet<Handle> = [alice, bob, Handle(40)].into_iter().collect();
        assert_eq!(logger.describe(&set), "[1 (alice), 2 (bob), 40 (?)]");
        assert_eq!(logger.describe(&BTreeSet::new()), "[]");
    }

    #[test]
    fn test_diff_logger_handles_every_event() {
        let repo = Arc::new(MemoryHandleRepo::new());
        let mut logger = DiffLogger::new(repo);
        logger.on_event(&flags_event());
        logger.on_event(&GroupEvent::MembersChanged(MembersChanged::default()));
    }
}
