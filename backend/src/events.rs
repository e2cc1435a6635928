//! Event broadcasting for todo changes.

use minimart_types::TodoEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Event broadcaster feeding every open MCP push stream.
#[derive(Clone)]
pub struct EventBroadcaster {
    /// Broadcast channel for events
    sender: Arc<broadcast::Sender<TodoEvent>>,
}

impl EventBroadcaster {
    /// Create a new event broadcaster with a buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Broadcast an event to all subscribers.
    pub fn broadcast(&self, event: TodoEvent) {
        debug!("Broadcasting event: {}", event.description());
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> broadcast::Receiver<TodoEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100) // Default buffer of 100 events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_broadcaster_creation() {
        let broadcaster = EventBroadcaster::new(10);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_broadcast_event() {
        let broadcaster = EventBroadcaster::new(10);
        let todo_id = Uuid::new_v4();

        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.broadcast(TodoEvent::TodoCreated {
            todo_id,
            user_id: "user_1".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.todo_id(), todo_id);
        assert_eq!(event.notification_method(), "notifications/todos/created");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers() {
        let broadcaster = EventBroadcaster::default();
        broadcaster.broadcast(TodoEvent::TodoDeleted {
            todo_id: Uuid::new_v4(),
            user_id: "user_1".to_string(),
        });
    }
}
