//! Runtime configuration read from the environment (and `.env`, if present).
//!
//! | Variable          | Default             |
//! |-------------------|---------------------|
//! | `TODO_BIND_ADDR`  | `127.0.0.1:3000`    |
//! | `TODO_STORAGE`    | `document`          |
//! | `DATABASE_URL`    | `sqlite://todos.db` |
//! | `TODO_COLLECTION` | `todos`             |

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_COLLECTION: &str = "todos";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Which repository adapter backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    Document { database_url: String, collection: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup("TODO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            key: "TODO_BIND_ADDR",
            message: format!("{raw_addr:?}: {e}"),
        })?;

        let storage = match lookup("TODO_STORAGE").as_deref().map(str::trim) {
            None | Some("") | Some("document") => StorageConfig::Document {
                database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                collection: lookup("TODO_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            },
            Some("memory") => StorageConfig::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "TODO_STORAGE",
                    message: format!("expected \"memory\" or \"document\", got {other:?}"),
                })
            }
        };

        Ok(Self { bind_addr, storage })
    }
}
