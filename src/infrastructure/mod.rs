pub mod document_repo;
pub mod memory_repo;

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::domain::{error::TodoError, repository::TodoRepository};

use document_repo::DocumentTodoRepository;
use memory_repo::MemoryTodoRepository;

/// Builds and initialises the adapter selected by configuration.
pub async fn build_repository(storage: &StorageConfig) -> Result<Arc<dyn TodoRepository>, TodoError> {
    let repo: Arc<dyn TodoRepository> = match storage {
        StorageConfig::Memory => Arc::new(MemoryTodoRepository::new()),
        StorageConfig::Document { database_url, collection } => {
            Arc::new(DocumentTodoRepository::new(database_url, collection)?)
        }
    };
    repo.init().await?;
    Ok(repo)
}
