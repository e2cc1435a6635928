//! Todo records and request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Unique identifier of a todo.
pub type TodoId = Uuid;

/// A single todo item owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Todo {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = Uuid))]
    pub id: TodoId,
    pub title: String,
    pub user_id: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Create a new, incomplete todo with a fresh ID.
    pub fn new(title: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            user_id: user_id.into(),
            is_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update and bump `updated_at`.
    pub fn apply(&mut self, update: &UpdateTodoRequest) {
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if let Some(is_complete) = update.is_complete {
            self.is_complete = is_complete;
        }
        self.updated_at = Utc::now();
    }

    /// Check whether this todo matches a filter.
    pub fn matches(&self, filter: &TodoFilter) -> bool {
        if self.user_id != filter.user_id {
            return false;
        }
        if let Some(is_complete) = filter.is_complete {
            if self.is_complete != is_complete {
                return false;
            }
        }
        match filter.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => self.title.to_lowercase().contains(&q.to_lowercase()),
            _ => true,
        }
    }
}

/// Request to create a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "validation", derive(garde::Validate))]
pub struct CreateTodoRequest {
    #[cfg_attr(feature = "validation", garde(length(min = 1)))]
    pub title: String,
    #[cfg_attr(feature = "validation", garde(length(min = 1)))]
    pub user_id: String,
    #[serde(default)]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub is_complete: bool,
}

/// Partial update of an existing todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "validation", derive(garde::Validate))]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1)))]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub is_complete: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn complete(is_complete: bool) -> Self {
        Self {
            title: None,
            is_complete: Some(is_complete),
        }
    }
}

/// Query for a user's todos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema, IntoParams))]
pub struct TodoFilter {
    /// Owner of the todos
    pub user_id: String,
    /// Only return todos in this completion state
    #[serde(default)]
    pub is_complete: Option<bool>,
    /// Case-insensitive substring match on the title
    #[serde(default, alias = "q")]
    pub search: Option<String>,
}

impl TodoFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_matches_status_and_search() {
        let mut todo = Todo::new("Buy Oat Milk", "user_1");
        let mut filter = TodoFilter::for_user("user_1");
        assert!(todo.matches(&filter));

        filter.search = Some("oat".to_string());
        assert!(todo.matches(&filter));

        filter.is_complete = Some(true);
        assert!(!todo.matches(&filter));

        todo.apply(&UpdateTodoRequest::complete(true));
        assert!(todo.matches(&filter));

        assert!(!todo.matches(&TodoFilter::for_user("user_2")));
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut todo = Todo::new("Write docs", "user_1");
        let created = todo.created_at;
        todo.apply(&UpdateTodoRequest {
            title: Some("Write better docs".to_string()),
            is_complete: None,
        });
        assert_eq!(todo.title, "Write better docs");
        assert!(!todo.is_complete);
        assert_eq!(todo.created_at, created);
        assert!(todo.updated_at >= created);
    }
}
