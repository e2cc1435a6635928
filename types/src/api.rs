//! API request and response types.

use crate::todo::{Todo, TodoId};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

// ============================================================================
// Todo API Types
// ============================================================================

/// Response containing a single todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TodoResponse {
    pub success: bool,
    pub message: String,
    pub data: Todo,
}

/// Response containing a list of todos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TodoListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Todo>,
}

/// Response for a deleted todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TodoDeletedResponse {
    pub success: bool,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = Uuid))]
    pub id: TodoId,
}

/// Response for an unknown todo ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TodoNotFoundResponse {
    pub error: String,
    /// The ID as given by the caller
    pub id: String,
}

impl TodoNotFoundResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            error: "Todo not found".to_string(),
            id: id.into(),
        }
    }
}

// ============================================================================
// Prompt API Types
// ============================================================================

/// Request to run a prompt through the configured language model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Generated completion for a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PromptResponse {
    pub success: bool,
    pub prompt: String,
    pub response: String,
    /// Token usage reported by the upstream provider, if any
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub usage: Option<serde_json::Value>,
}

// ============================================================================
// Generic Types
// ============================================================================

/// Failure envelope for endpoints that report `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

impl FailureResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Liveness response for `/ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PingResponse {
    pub status: String,
}
