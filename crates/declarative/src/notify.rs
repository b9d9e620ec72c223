//! Notification edges and the end-of-run queue

use crate::types::{NotifyAction, Timing};
use serde::{Deserialize, Serialize};

/// "When `source` changes, trigger `action` on `target`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEdge {
    pub source: String,
    pub target: String,
    pub action: NotifyAction,
    pub timing: Timing,
}

impl NotificationEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        action: NotifyAction,
        timing: Timing,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            action,
            timing,
        }
    }
}

/// A deferred notification waiting for the end of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    /// Resource that first scheduled this notification
    pub source: String,
    pub target: String,
    pub action: NotifyAction,
}

/// Deferred notifications in first-scheduled order
///
/// Scheduling the same action on the same target twice collapses to one
/// entry; the first scheduler is kept as the recorded source.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Vec<Pending>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a notification, returns false if it was already queued
    pub fn schedule(&mut self, source: &str, target: &str, action: NotifyAction) -> bool {
        if self
            .pending
            .iter()
            .any(|p| p.target == target && p.action == action)
        {
            return false;
        }
        self.pending.push(Pending {
            source: source.to_string(),
            target: target.to_string(),
            action,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every pending notification, emptying the queue
    pub fn drain(&mut self) -> Vec<Pending> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_dedups_same_target_and_action() {
        let mut queue = NotificationQueue::new();
        assert!(queue.schedule("template[a]", "service[s]", NotifyAction::Restart));
        assert!(!queue.schedule("template[b]", "service[s]", NotifyAction::Restart));
        assert_eq!(queue.len(), 1);

        let drained = queue.drain();
        assert_eq!(drained[0].source, "template[a]");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_keeps_distinct_actions_in_order() {
        let mut queue = NotificationQueue::new();
        queue.schedule("a", "service[s]", NotifyAction::Reload);
        queue.schedule("b", "execute[x]", NotifyAction::Run);
        queue.schedule("c", "service[s]", NotifyAction::Restart);

        let targets: Vec<_> = queue
            .drain()
            .into_iter()
            .map(|p| (p.target, p.action))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("service[s]".to_string(), NotifyAction::Reload),
                ("execute[x]".to_string(), NotifyAction::Run),
                ("service[s]".to_string(), NotifyAction::Restart),
            ]
        );
    }
}
