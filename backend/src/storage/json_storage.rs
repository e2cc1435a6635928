//! JSON file-based storage implementation.

use super::{new_todo, newest_first, Result, StorageError, TodoStorage};
use async_trait::async_trait;
use minimart_types::{
    CreateTodoRequest, Todo, TodoFilter, TodoId, UpdateTodoRequest, MAX_TODOS_PER_USER,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// JSON file storage format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StorageFormat {
    version: u32,
    todos: Vec<Todo>,
}

impl Default for StorageFormat {
    fn default() -> Self {
        Self {
            version: 1,
            todos: Vec::new(),
        }
    }
}

/// Storage backend that persists todos to a JSON file.
pub struct JsonFileStorage {
    path: PathBuf,
    cache: RwLock<Option<HashMap<TodoId, Todo>>>,
    /// Serializes read-modify-write cycles against the file
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    /// Create a new JSON file storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load todos from file, using cache if available.
    async fn load_from_file(&self) -> Result<HashMap<TodoId, Todo>> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(todos) = cache.as_ref() {
                debug!("Returning cached todos");
                return Ok(todos.clone());
            }
        }

        debug!("Loading todos from {:?}", self.path);

        if !self.path.exists() {
            info!("Storage file does not exist, starting with empty todos");
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&self.path).await?;

        if contents.trim().is_empty() {
            info!("Storage file is empty, starting with empty todos");
            return Ok(HashMap::new());
        }

        let storage: StorageFormat = serde_json::from_str(&contents)?;

        let todos: HashMap<TodoId, Todo> = storage
            .todos
            .into_iter()
            .map(|todo| (todo.id, todo))
            .collect();

        info!("Loaded {} todos from storage", todos.len());

        {
            let mut cache = self.cache.write().await;
            *cache = Some(todos.clone());
        }

        Ok(todos)
    }

    /// Write todos to file and update cache.
    async fn write_to_file(&self, todos: &HashMap<TodoId, Todo>) -> Result<()> {
        debug!("Writing {} todos to {:?}", todos.len(), self.path);

        let storage = StorageFormat {
            version: 1,
            todos: todos.values().cloned().collect(),
        };

        let json = serde_json::to_string_pretty(&storage)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write to temporary file first, then rename (atomic operation)
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;

        {
            let mut cache = self.cache.write().await;
            *cache = Some(todos.clone());
        }

        Ok(())
    }

    /// Invalidate the cache.
    pub async fn invalidate_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
        debug!("Cache invalidated");
    }
}

#[async_trait]
impl TodoStorage for JsonFileStorage {
    async fn create(&self, request: CreateTodoRequest) -> Result<Todo> {
        let _guard = self.write_lock.lock().await;
        let mut todos = self.load_from_file().await?;

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
        todos.insert(todo.id, todo.clone());
        self.write_to_file(&todos).await?;
        info!("Todo created: {}", todo.id);
        Ok(todo)
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>> {
        Ok(self.load_from_file().await?.remove(id))
    }

    async fn list(&self, filter: &TodoFilter) -> Result<Vec<Todo>> {
        let mut todos: Vec<Todo> = self
            .load_from_file()
            .await?
            .into_values()
            .filter(|t| t.matches(filter))
            .collect();
        newest_first(&mut todos);
        debug!("Retrieved {} todos for user: {}", todos.len(), filter.user_id);
        Ok(todos)
    }

    async fn update(&self, id: &TodoId, update: &UpdateTodoRequest) -> Result<Option<Todo>> {
        let _guard = self.write_lock.lock().await;
        let mut todos = self.load_from_file().await?;

        let Some(todo) = todos.get_mut(id) else {
            warn!("Todo not found with ID: {}", id);
            return Ok(None);
        };
        todo.apply(update);
        let updated = todo.clone();

        self.write_to_file(&todos).await?;
        info!("Todo updated: {}", id);
        Ok(Some(updated))
    }

    async fn delete(&self, id: &TodoId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut todos = self.load_from_file().await?;

        if todos.remove(id).is_none() {
            warn!("Attempted to delete non-existent todo: {}", id);
            return Ok(false);
        }

        self.write_to_file(&todos).await?;
        info!("Todo deleted: {}", id);
        Ok(true)
    }
}
