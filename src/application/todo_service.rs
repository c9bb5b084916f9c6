use crate::domain::error::TodoError;
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{CreateTodo, Todo, TodoId, UpdateTodo};
use async_trait::async_trait;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn get_all(&self) -> Result<Vec<Todo>, TodoError>;
    async fn find(&self, id: TodoId) -> Result<Todo, TodoError>;
    async fn create(&self, input: CreateTodo) -> Result<TodoId, TodoError>;
    async fn update(&self, id: TodoId, changes: UpdateTodo) -> Result<(), TodoError>;
    async fn delete(&self, id: TodoId) -> Result<(), TodoError>;
}

/// Forwards every call to the repository; results and errors pass through unchanged.
#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn get_all(&self) -> Result<Vec<Todo>, TodoError> { self.repo.get_all().await }

    async fn find(&self, id: TodoId) -> Result<Todo, TodoError> { self.repo.get_by_id(id).await }

    async fn create(&self, input: CreateTodo) -> Result<TodoId, TodoError> {
        let id = self.repo.insert(input).await?;
        tracing::info!(%id, "todo created");
        Ok(id)
    }

    async fn update(&self, id: TodoId, changes: UpdateTodo) -> Result<(), TodoError> {
        self.repo.update(id, changes).await?;
        tracing::debug!(%id, "todo updated");
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<(), TodoError> {
        self.repo.delete(id).await?;
        tracing::info!(%id, "todo deleted");
        Ok(())
    }
}
