//! Application state management.

use crate::catalog::Catalog;
use crate::events::EventBroadcaster;
use crate::llm::{PromptClient, PromptConfig};
use crate::storage::{MemoryStorage, StorageError, TodoStorage};
use garde::Validate;
use minimart_types::{
    CreateTodoRequest, Todo, TodoEvent, TodoFilter, TodoId, UpdateTodoRequest,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Todo storage backend
    storage: Arc<dyn TodoStorage>,
    /// Read-only master data
    catalog: Catalog,
    /// Event broadcaster for real-time updates
    events: EventBroadcaster,
    /// Outbound prompt proxy
    prompt: PromptClient,
}

impl AppState {
    /// Create new application state with the given storage backend.
    pub fn new(storage: impl TodoStorage + 'static, prompt: PromptConfig) -> Self {
        Self::with_storage(Arc::new(storage), prompt)
    }

    /// Create new application state from an already shared storage backend.
    pub fn with_storage(storage: Arc<dyn TodoStorage>, prompt: PromptConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                storage,
                catalog: Catalog::new(),
                events: EventBroadcaster::default(),
                prompt: PromptClient::new(prompt),
            }),
        }
    }

    /// Get the event broadcaster.
    pub fn events(&self) -> &EventBroadcaster {
        &self.inner.events
    }

    /// Get the master data catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get the prompt proxy client.
    pub fn prompt(&self) -> &PromptClient {
        &self.inner.prompt
    }

    // ========================================================================
    // Todos
    // ========================================================================

    /// Validate and create a todo, then broadcast the change.
    pub async fn create_todo(&self, mut request: CreateTodoRequest) -> Result<Todo, StorageError> {
        request.title = request.title.trim().to_string();
        request.user_id = request.user_id.trim().to_string();
        request
            .validate()
            .map_err(|report| StorageError::Validation(validation_message(&report)))?;

        let todo = self.inner.storage.create(request).await?;
        info!("Created todo {} for user {}", todo.id, todo.user_id);
        self.events().broadcast(TodoEvent::TodoCreated {
            todo_id: todo.id,
            user_id: todo.user_id.clone(),
        });
        Ok(todo)
    }

    /// Get a single todo.
    pub async fn get_todo(&self, id: &TodoId) -> Result<Option<Todo>, StorageError> {
        self.inner.storage.get(id).await
    }

    /// List a user's todos.
    pub async fn list_todos(&self, filter: &TodoFilter) -> Result<Vec<Todo>, StorageError> {
        let todos = self.inner.storage.list(filter).await?;
        debug!("Retrieved {} todos for user: {}", todos.len(), filter.user_id);
        Ok(todos)
    }

    /// Apply a partial update. Returns `None` if the todo does not exist.
    pub async fn update_todo(
        &self,
        id: &TodoId,
        mut update: UpdateTodoRequest,
    ) -> Result<Option<Todo>, StorageError> {
        if let Some(title) = update.title.as_mut() {
            *title = title.trim().to_string();
        }
        update
            .validate()
            .map_err(|report| StorageError::Validation(validation_message(&report)))?;

        let todo = self.inner.storage.update(id, &update).await?;
        if let Some(ref todo) = todo {
            info!("Updated todo {}", todo.id);
            self.events().broadcast(TodoEvent::TodoUpdated {
                todo_id: todo.id,
                user_id: todo.user_id.clone(),
            });
        }
        Ok(todo)
    }

    /// Mark a todo completed.
    pub async fn complete_todo(&self, id: &TodoId) -> Result<Option<Todo>, StorageError> {
        self.update_todo(id, UpdateTodoRequest::complete(true)).await
    }

    /// Mark a todo incomplete.
    pub async fn reopen_todo(&self, id: &TodoId) -> Result<Option<Todo>, StorageError> {
        self.update_todo(id, UpdateTodoRequest::complete(false)).await
    }

    /// Delete a todo. Returns `false` if it did not exist.
    pub async fn delete_todo(&self, id: &TodoId) -> Result<bool, StorageError> {
        let Some(todo) = self.inner.storage.get(id).await? else {
            return Ok(false);
        };
        let deleted = self.inner.storage.delete(id).await?;
        if deleted {
            info!("Deleted todo {}", id);
            self.events().broadcast(TodoEvent::TodoDeleted {
                todo_id: todo.id,
                user_id: todo.user_id,
            });
        }
        Ok(deleted)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(MemoryStorage::new(), PromptConfig::default())
    }
}

/// Turn a garde report into the user-facing messages todo clients expect.
fn validation_message(report: &garde::Report) -> String {
    report
        .iter()
        .map(|(path, error)| match path.to_string().as_str() {
            "title" => "Title is required".to_string(),
            "user_id" => "User ID is required".to_string(),
            other => format!("{}: {}", other, error),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(title: &str, user_id: &str) -> CreateTodoRequest {
        CreateTodoRequest {
            title: title.to_string(),
            user_id: user_id.to_string(),
            is_complete: false,
        }
    }

    #[tokio::test]
    async fn test_create_todo_trims_and_validates() {
        let state = AppState::default();

        let todo = state
            .create_todo(create_request("  Order bread  ", " user_1 "))
            .await
            .unwrap();
        assert_eq!(todo.title, "Order bread");
        assert_eq!(todo.user_id, "user_1");

        let err = state
            .create_todo(create_request("   ", "user_1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let err = state.create_todo(create_request("x", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "User ID is required");
    }

    #[tokio::test]
    async fn test_mutations_broadcast_events() {
        let state = AppState::default();
        let mut rx = state.events().subscribe();

        let todo = state
            .create_todo(create_request("Check fridge", "user_1"))
            .await
            .unwrap();
        state.complete_todo(&todo.id).await.unwrap().unwrap();
        assert!(state.delete_todo(&todo.id).await.unwrap());
        assert!(!state.delete_todo(&todo.id).await.unwrap());

        assert!(matches!(rx.recv().await.unwrap(), TodoEvent::TodoCreated { .. }));
        assert!(matches!(rx.recv().await.unwrap(), TodoEvent::TodoUpdated { .. }));
        assert!(matches!(rx.recv().await.unwrap(), TodoEvent::TodoDeleted { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reopen_todo() {
        let state = AppState::default();
        let todo = state
            .create_todo(CreateTodoRequest {
                title: "Done already".to_string(),
                user_id: "user_1".to_string(),
                is_complete: true,
            })
            .await
            .unwrap();
        assert!(todo.is_complete);

        let reopened = state.reopen_todo(&todo.id).await.unwrap().unwrap();
        assert!(!reopened.is_complete);

        assert!(state
            .reopen_todo(&TodoId::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
