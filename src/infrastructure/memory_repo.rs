use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    error::TodoError,
    repository::TodoRepository,
    todo::{CreateTodo, Todo, TodoId, UpdateTodo},
};

/// Todos held in process memory. Clones share the same store.
#[derive(Clone, Default)]
pub struct MemoryTodoRepository {
    items: Arc<RwLock<HashMap<TodoId, Todo>>>,
}

impl MemoryTodoRepository {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn get_all(&self) -> Result<Vec<Todo>, TodoError> {
        let mut todos: Vec<Todo> = self.items.read().await.values().cloned().collect();
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    async fn get_by_id(&self, id: TodoId) -> Result<Todo, TodoError> {
        self.items.read().await.get(&id).cloned().ok_or(TodoError::NotFound(id))
    }

    async fn insert(&self, input: CreateTodo) -> Result<TodoId, TodoError> {
        let now = Utc::now();
        let id = TodoId::new();
        let todo = Todo {
            id,
            title: input.title,
            description: input.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        self.items.write().await.insert(id, todo);
        Ok(id)
    }

    async fn update(&self, id: TodoId, changes: UpdateTodo) -> Result<(), TodoError> {
        let mut items = self.items.write().await;
        let todo = items.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        todo.apply(changes, Utc::now());
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<(), TodoError> {
        self.items.write().await.remove(&id).map(|_| ()).ok_or(TodoError::NotFound(id))
    }
}
