//! Notification channel for vote changes.
use likes_shared::types::VoteChanged;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts `VoteChanged` events to every subscriber.
///
/// Slow subscribers that fall more than the channel capacity behind miss events
/// and observe `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct VoteEvents {
    sender: broadcast::Sender<VoteChanged>,
}

impl VoteEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoteChanged> {
        self.sender.subscribe()
    }

    /// Publishes an event. Having no subscriber is not an error.
    pub fn publish(&self, event: VoteChanged) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            trace!(resource_id = event.resource_id, "No subscriber for vote event");
        }
    }
}

impl Default for VoteEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use likes_shared::types::VoteChangeKind;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let events = VoteEvents::default();
        let mut first = events.subscribe();
        let mut second = events.subscribe();

        events.publish(VoteChanged::new(4, VoteChangeKind::Created));

        assert_eq!(first.recv().await.unwrap().resource_id, 4);
        assert_eq!(second.recv().await.unwrap().action, VoteChangeKind::Created);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let events = VoteEvents::new(4);
        events.publish(VoteChanged::new(1, VoteChangeKind::Deleted));
    }
}
