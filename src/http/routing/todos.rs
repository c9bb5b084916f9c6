use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};

use crate::application::todo_service::TodoService;
use crate::domain::todo::{CreateTodo, TodoId, UpdateTodo};
use crate::http::types::{ApiError, CreateTodoInput, CreateTodoOutput, TodoOutput, UpdateTodoInput};

pub struct AppState<S: TodoService> {
    pub service: Arc<S>,
}

impl<S: TodoService> AppState<S> {
    pub fn new(service: S) -> Self { Self { service: Arc::new(service) } }
}

impl<S: TodoService> Clone for AppState<S> {
    fn clone(&self) -> Self { Self { service: Arc::clone(&self.service) } }
}

pub fn router<S: TodoService>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todo", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todo/:id", get(get_todo::<S>).put(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<TodoOutput>>, ApiError> {
    let todos = state.service.get_all().await?;
    Ok(Json(todos.into_iter().map(TodoOutput::from).collect()))
}

async fn get_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TodoOutput>, ApiError> {
    let id = parse_id(path)?;
    let todo = state.service.find(id).await?;
    Ok(Json(todo.into()))
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateTodoInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTodoOutput>), ApiError> {
    let Json(input) = payload?;
    let id = state.service.create(CreateTodo::try_from(input)?).await?;
    Ok((StatusCode::CREATED, Json(CreateTodoOutput { todo_id: id.to_string() })))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateTodoInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(path)?;
    let Json(input) = payload?;
    state.service.update(id, UpdateTodo::try_from(input)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(path)?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> Result<TodoId, ApiError> {
    let Path(raw) = path?;
    if raw.trim().is_empty() {
        return Err(ApiError::bad_request("ID is empty."));
    }
    raw.parse().map_err(|e| ApiError::bad_request("ID is invalid.").with_detail(e))
}
