//! Events for real-time updates across MCP sessions.

use crate::TodoId;
use serde::{Deserialize, Serialize};

/// Event types that can be broadcast to all open push streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TodoEvent {
    /// A todo was created
    TodoCreated { todo_id: TodoId, user_id: String },
    /// A todo was updated (including complete/reopen)
    TodoUpdated { todo_id: TodoId, user_id: String },
    /// A todo was deleted
    TodoDeleted { todo_id: TodoId, user_id: String },
}

impl TodoEvent {
    /// Get a human-readable description of the event.
    pub fn description(&self) -> String {
        match self {
            TodoEvent::TodoCreated { todo_id, user_id } => {
                format!("Todo {} created for user {}", todo_id, user_id)
            }
            TodoEvent::TodoUpdated { todo_id, user_id } => {
                format!("Todo {} updated for user {}", todo_id, user_id)
            }
            TodoEvent::TodoDeleted { todo_id, user_id } => {
                format!("Todo {} deleted for user {}", todo_id, user_id)
            }
        }
    }

    /// JSON-RPC notification method used when pushing this event to MCP clients.
    pub fn notification_method(&self) -> &'static str {
        match self {
            TodoEvent::TodoCreated { .. } => "notifications/todos/created",
            TodoEvent::TodoUpdated { .. } => "notifications/todos/updated",
            TodoEvent::TodoDeleted { .. } => "notifications/todos/deleted",
        }
    }

    pub fn todo_id(&self) -> TodoId {
        match self {
            TodoEvent::TodoCreated { todo_id, .. }
            | TodoEvent::TodoUpdated { todo_id, .. }
            | TodoEvent::TodoDeleted { todo_id, .. } => *todo_id,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            TodoEvent::TodoCreated { user_id, .. }
            | TodoEvent::TodoUpdated { user_id, .. }
            | TodoEvent::TodoDeleted { user_id, .. } => user_id,
        }
    }
}
