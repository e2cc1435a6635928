//! In-memory storage, used by default and in tests.

use super::{new_todo, newest_first, Result, StorageError, TodoStorage};
use async_trait::async_trait;
use minimart_types::{
    CreateTodoRequest, Todo, TodoFilter, TodoId, UpdateTodoRequest, MAX_TODOS_PER_USER,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Storage backend that keeps todos in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    todos: RwLock<HashMap<TodoId, Todo>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStorage for MemoryStorage {
    async fn create(&self, request: CreateTodoRequest) -> Result<Todo> {
        let mut todos = self.todos.write().await;
        let owned = todos
            .values()
            .filter(|t| t.user_id == request.user_id)
            .count();
        if owned >= MAX_TODOS_PER_USER {
            return Err(StorageError::LimitReached {
                user_id: request.user_id,
            });
        }

        let todo = new_todo(request);
        debug!("Created todo {} in memory", todo.id);
        todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>> {
        Ok(self.todos.read().await.get(id).cloned())
    }

    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>> {
        let todos = self.todos.read().await;
        let mut matching: Vec<Todo> = todos.values().filter(|t| t.matches(filter)).cloned().collect();
        newest_first(&mut matching);
        Ok(matching)
    }

    async fn update(&self, id: &TodoId, update: &UpdateTodoRequest) -> Result<Option<Todo>> {
        let mut todos = self.todos.write().await;
        Ok(todos.get_mut(id).map(|todo| {
            todo.apply(update);
            todo.clone()
        }))
    }

    async fn delete(&self, id: &TodoId) -> Result<bool> {
        Ok(self.todos.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance;

    #[tokio::test]
    async fn test_create_and_list() {
        conformance::create_and_list(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_cap_per_user() {
        conformance::cap_per_user(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        conformance::update_and_delete(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn test_concurrent_creates_respect_cap() {
        let storage = std::sync::Arc::new(MemoryStorage::new());
        let mut handles = Vec::new();
        for i in 0..10 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .create(CreateTodoRequest {
                        title: format!("Race {}", i),
                        user_id: "racer".to_string(),
                        is_complete: false,
                    })
                    .await
                    .is_ok()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, MAX_TODOS_PER_USER);
    }
}
