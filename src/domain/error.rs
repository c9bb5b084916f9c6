use thiserror::Error;

use super::todo::TodoId;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
