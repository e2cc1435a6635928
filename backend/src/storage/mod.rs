//! Storage layer for persisting todos.

mod json_storage;
mod memory;
mod postgres_storage;

pub use json_storage::JsonFileStorage;
pub use memory::MemoryStorage;
pub use postgres_storage::PostgresStorage;

use async_trait::async_trait;
use minimart_types::{
    CreateTodoRequest, Todo, TodoFilter, TodoId, UpdateTodoRequest, MAX_TODOS_PER_USER,
};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    #[error(
        "Maximum of {} todos per user reached. Delete an existing todo first.",
        MAX_TODOS_PER_USER
    )]
    LimitReached { user_id: String },

    #[error("{0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for todo storage backends.
///
/// Implementations must enforce [`MAX_TODOS_PER_USER`] atomically in
/// [`TodoStorage::create`]: two concurrent creates for the same user may not
/// both observe a free slot.
#[async_trait]
pub trait TodoStorage: Send + Sync {
    /// Create a todo for `request.user_id`.
    async fn create(&self, request: CreateTodoRequest) -> Result<Todo>;

    /// Get a todo by ID.
    async fn get(&self, id: &TodoId) -> Result<Option<Todo>>;

    /// List a user's todos matching the filter, newest first.
    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>>;

    /// Apply a partial update. Returns `None` if the todo does not exist.
    async fn update(&self, id: &TodoId, update: &UpdateTodoRequest) -> Result<Option<Todo>>;

    /// Delete a todo. Returns `false` if it did not exist.
    async fn delete(&self, id: &TodoId) -> Result<bool>;
}

/// Build the todo for a validated create request.
pub(crate) fn new_todo(request: CreateTodoRequest) -> Todo {
    let mut todo = Todo::new(request.title, request.user_id);
    todo.is_complete = request.is_complete;
    todo
}

/// Sort todos newest first.
pub(crate) fn newest_first(todos: &mut [Todo]) {
    todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
