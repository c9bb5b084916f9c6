use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::TodoError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TodoId(pub Uuid);

impl TodoId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }

    /// The null identifier. Never assigned to a stored todo.
    pub fn nil() -> Self { Self(Uuid::nil()) }

    pub fn is_nil(&self) -> bool { self.0.is_nil() }
}

impl Default for TodoId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

impl FromStr for TodoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(TodoId) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Applies an update, keeping `updated_at` from moving backwards.
    pub fn apply(&mut self, changes: UpdateTodo, now: DateTime<Utc>) {
        self.title = changes.title;
        self.description = changes.description;
        self.completed = changes.completed;
        self.updated_at = now.max(self.updated_at);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodo {
    pub title: String,
    pub description: String,
}

impl CreateTodo {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Result<Self, TodoError> {
        Ok(Self { title: require_title(title.into())?, description: description.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTodo {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl UpdateTodo {
    pub fn new(title: impl Into<String>, description: impl Into<String>, completed: bool) -> Result<Self, TodoError> {
        Ok(Self { title: require_title(title.into())?, description: description.into(), completed })
    }
}

fn require_title(title: String) -> Result<String, TodoError> {
    if title.trim().is_empty() {
        return Err(TodoError::Validation("title must not be empty".into()));
    }
    Ok(title)
}
