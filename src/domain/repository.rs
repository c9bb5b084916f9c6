use std::sync::Arc;

use async_trait::async_trait;

use super::error::TodoError;
use super::todo::{CreateTodo, Todo, TodoId, UpdateTodo};

/// Persistence contract for todos. Adapters own id and timestamp assignment.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> Result<(), TodoError> { Ok(()) }
    /// All todos, oldest first. An empty store is not an error.
    async fn get_all(&self) -> Result<Vec<Todo>, TodoError>;
    async fn get_by_id(&self, id: TodoId) -> Result<Todo, TodoError>;
    async fn insert(&self, input: CreateTodo) -> Result<TodoId, TodoError>;
    /// Fails with `NotFound` instead of creating the record.
    async fn update(&self, id: TodoId, changes: UpdateTodo) -> Result<(), TodoError>;
    async fn delete(&self, id: TodoId) -> Result<(), TodoError>;
}

#[async_trait]
impl<R: TodoRepository + ?Sized> TodoRepository for Arc<R> {
    async fn init(&self) -> Result<(), TodoError> { (**self).init().await }
    async fn get_all(&self) -> Result<Vec<Todo>, TodoError> { (**self).get_all().await }
    async fn get_by_id(&self, id: TodoId) -> Result<Todo, TodoError> { (**self).get_by_id(id).await }
    async fn insert(&self, input: CreateTodo) -> Result<TodoId, TodoError> { (**self).insert(input).await }
    async fn update(&self, id: TodoId, changes: UpdateTodo) -> Result<(), TodoError> { (**self).update(id, changes).await }
    async fn delete(&self, id: TodoId) -> Result<(), TodoError> { (**self).delete(id).await }
}
