use super::types::BridgeEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast publisher for bridge lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub event: BridgeEvent,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Publishing with no subscribers is not an error; the event is dropped.
    pub fn publish(&self, event: BridgeEvent) {
        trace!(event = event.name(), instance_id = %event.instance_id(), "Publishing bridge event");
        let published = PublishedEvent {
            event,
            published_at: chrono::Utc::now(),
        };
        let _ = self.sender.send(published);
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::defaults::EVENT_CHANNEL_CAPACITY)
    }
}
