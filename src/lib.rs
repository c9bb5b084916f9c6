//! Layered todo-list CRUD backend: domain, repository adapters, service and
//! an axum HTTP surface.

pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod infrastructure;
