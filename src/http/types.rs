use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::error::TodoError;
use crate::domain::todo::{CreateTodo, Todo, UpdateTodo};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOutput {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), detail: None }
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorOutput { status: self.status.as_u16(), message: self.message, error: self.detail };
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Item does not exist.").with_detail(err),
            TodoError::Validation(_) => ApiError::bad_request("Validation error").with_detail(err),
            TodoError::Storage(ref source) => {
                tracing::error!(error = %source, "storage failure");
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Something went wrong!").with_detail(err)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Request model is invalid.").with_detail(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request("ID is invalid.").with_detail(rejection.body_text())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoOutput {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoOutput {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id.to_string(),
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl TryFrom<CreateTodoInput> for CreateTodo {
    type Error = TodoError;

    fn try_from(input: CreateTodoInput) -> Result<Self, Self::Error> { CreateTodo::new(input.title, input.description) }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTodoOutput {
    pub todo_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTodoInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl TryFrom<UpdateTodoInput> for UpdateTodo {
    type Error = TodoError;

    fn try_from(input: UpdateTodoInput) -> Result<Self, Self::Error> {
        UpdateTodo::new(input.title, input.description, input.completed)
    }
}
