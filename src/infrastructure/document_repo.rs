use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    ConnectOptions, Connection, Row,
};

use crate::domain::{
    error::TodoError,
    repository::TodoRepository,
    todo::{CreateTodo, Todo, TodoId, UpdateTodo},
};

/// Persisted shape of a todo inside a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Todo> for TodoDocument {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.to_string(),
            title: todo.title.clone(),
            description: todo.description.clone(),
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

impl TryFrom<TodoDocument> for Todo {
    type Error = TodoError;

    fn try_from(doc: TodoDocument) -> Result<Self, Self::Error> {
        let id = doc
            .id
            .parse::<TodoId>()
            .with_context(|| format!("document has malformed _id {:?}", doc.id))?;
        Ok(Todo {
            id,
            title: doc.title,
            description: doc.description,
            completed: doc.completed,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

impl From<sqlx::Error> for TodoError {
    fn from(err: sqlx::Error) -> Self { TodoError::Storage(err.into()) }
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self { TodoError::Storage(err.into()) }
}

/// Document collection backed by a SQLite file. Each call opens its own
/// connection and closes it before returning.
#[derive(Clone, Debug)]
pub struct DocumentTodoRepository {
    options: SqliteConnectOptions,
    collection: String,
}

impl DocumentTodoRepository {
    pub fn new(database_url: &str, collection: &str) -> Result<Self, TodoError> {
        if !is_valid_collection_name(collection) {
            return Err(TodoError::Validation(format!("invalid collection name {collection:?}")));
        }
        // Every call opens a fresh connection, so an in-memory database would
        // vanish between calls.
        if is_in_memory_url(database_url) {
            return Err(TodoError::Validation(format!(
                "in-memory database {database_url:?} cannot back a document collection"
            )));
        }
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let filename = options.clone().get_filename();
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating database directory {}", parent.display()))?;
            }
        }
        Ok(Self { options, collection: collection.to_string() })
    }

    /// Quoted collection name, safe to splice into SQL.
    fn table(&self) -> String { format!("\"{}\"", self.collection) }

    async fn connect(&self) -> Result<SqliteConnection, TodoError> {
        Ok(self.options.connect().await?)
    }

    async fn disconnect(&self, conn: SqliteConnection) {
        if let Err(err) = conn.close().await {
            tracing::warn!(collection = %self.collection, error = %err, "failed to close connection");
        }
    }

    async fn find_all(&self, conn: &mut SqliteConnection) -> Result<Vec<Todo>, TodoError> {
        let sql = format!("SELECT _id, document FROM {}", self.table());
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

        let mut todos = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("_id")?;
            let document: String = row.try_get("document")?;
            match decode(&document) {
                Ok(todo) => todos.push(todo),
                Err(err) => tracing::warn!(%id, error = %err, "skipping undecodable document"),
            }
        }
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    async fn find_one(&self, conn: &mut SqliteConnection, id: TodoId) -> Result<Todo, TodoError> {
        let sql = format!("SELECT document FROM {} WHERE _id = ?1", self.table());
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(TodoError::NotFound(id))?;
        decode(row.try_get::<&str, _>("document")?)
    }

    async fn insert_one(&self, conn: &mut SqliteConnection, todo: &Todo) -> Result<(), TodoError> {
        let document = TodoDocument::from(todo);
        let sql = format!("INSERT INTO {} (_id, document) VALUES (?1, ?2)", self.table());
        sqlx::query(&sql)
            .bind(&document.id)
            .bind(serde_json::to_string(&document)?)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn update_one(&self, conn: &mut SqliteConnection, id: TodoId, changes: UpdateTodo) -> Result<(), TodoError> {
        let mut tx = conn.begin().await?;

        let select = format!("SELECT document FROM {} WHERE _id = ?1", self.table());
        let row = sqlx::query(&select)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TodoError::NotFound(id))?;
        let mut todo = decode(row.try_get::<&str, _>("document")?)?;
        todo.apply(changes, Utc::now());

        let update = format!("UPDATE {} SET document = ?2 WHERE _id = ?1", self.table());
        let result = sqlx::query(&update)
            .bind(id.to_string())
            .bind(serde_json::to_string(&TodoDocument::from(&todo))?)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(TodoError::NotFound(id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_one(&self, conn: &mut SqliteConnection, id: TodoId) -> Result<(), TodoError> {
        let sql = format!("DELETE FROM {} WHERE _id = ?1", self.table());
        let result = sqlx::query(&sql).bind(id.to_string()).execute(&mut *conn).await?;
        if result.rows_affected() == 0 {
            return Err(TodoError::NotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for DocumentTodoRepository {
    async fn init(&self) -> Result<(), TodoError> {
        let mut conn = self.connect().await?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                _id TEXT PRIMARY KEY,
                document TEXT NOT NULL
            )",
            self.table()
        );
        let result = sqlx::query(&sql).execute(&mut conn).await.map(|_| ()).map_err(TodoError::from);
        self.disconnect(conn).await;
        result
    }

    async fn get_all(&self) -> Result<Vec<Todo>, TodoError> {
        let mut conn = self.connect().await?;
        let result = self.find_all(&mut conn).await;
        self.disconnect(conn).await;
        result
    }

    async fn get_by_id(&self, id: TodoId) -> Result<Todo, TodoError> {
        let mut conn = self.connect().await?;
        let result = self.find_one(&mut conn, id).await;
        self.disconnect(conn).await;
        result
    }

    async fn insert(&self, input: CreateTodo) -> Result<TodoId, TodoError> {
        let now = Utc::now();
        let todo = Todo {
            id: TodoId::new(),
            title: input.title,
            description: input.description,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        let mut conn = self.connect().await?;
        let result = self.insert_one(&mut conn, &todo).await;
        self.disconnect(conn).await;
        result.map(|()| todo.id)
    }

    async fn update(&self, id: TodoId, changes: UpdateTodo) -> Result<(), TodoError> {
        let mut conn = self.connect().await?;
        let result = self.update_one(&mut conn, id, changes).await;
        self.disconnect(conn).await;
        result
    }

    async fn delete(&self, id: TodoId) -> Result<(), TodoError> {
        let mut conn = self.connect().await?;
        let result = self.delete_one(&mut conn, id).await;
        self.disconnect(conn).await;
        result
    }
}

fn decode(document: &str) -> Result<Todo, TodoError> {
    serde_json::from_str::<TodoDocument>(document)?.try_into()
}

fn is_in_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn is_valid_collection_name(name: &str) -> bool {
    if name.to_ascii_lowercase().starts_with("sqlite_") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn repo() -> (TempDir, DocumentTodoRepository) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("todos.db").display());
        let repo = DocumentTodoRepository::new(&url, "todos").unwrap();
        repo.init().await.unwrap();
        (dir, repo)
    }

    fn create(title: &str) -> CreateTodo { CreateTodo::new(title, "desc").unwrap() }

    #[test]
    fn rejects_unsafe_collection_names() {
        assert!(DocumentTodoRepository::new("sqlite::memory:", "todos; DROP TABLE x").is_err());
        assert!(DocumentTodoRepository::new("sqlite::memory:", "1todos").is_err());
        assert!(DocumentTodoRepository::new("sqlite::memory:", "").is_err());
        assert!(DocumentTodoRepository::new("sqlite::memory:", "sqlite_master").is_err());
        assert!(DocumentTodoRepository::new("sqlite://todos.db", "todo_items").is_ok());
    }

    #[test]
    fn rejects_in_memory_databases() {
        for url in ["sqlite::memory:", "sqlite://:memory:", "sqlite:file:todos?mode=memory"] {
            assert!(
                matches!(DocumentTodoRepository::new(url, "todos"), Err(TodoError::Validation(_))),
                "{url} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("app.db");
        let repo = DocumentTodoRepository::new(&format!("sqlite://{}", path.display()), "todos").unwrap();
        repo.init().await.unwrap();

        let id = repo.insert(create("nested")).await.unwrap();
        assert_eq!(repo.get_by_id(id).await.unwrap().title, "nested");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn reserved_words_work_as_collection_names() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("todos.db").display());
        let repo = DocumentTodoRepository::new(&url, "select").unwrap();
        repo.init().await.unwrap();

        let id = repo.insert(create("quoted")).await.unwrap();
        repo.update(id, UpdateTodo::new("still quoted", "", true).unwrap()).await.unwrap();
        assert_eq!(repo.get_all().await.unwrap()[0].title, "still quoted");
        repo.delete(id).await.unwrap();
    }

    #[test]
    fn document_uses_underscore_id() {
        let now = Utc::now();
        let todo = Todo {
            id: TodoId::new(),
            title: "t".into(),
            description: "d".into(),
            completed: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(TodoDocument::from(&todo)).unwrap();
        assert_eq!(json["_id"], todo.id.to_string());
        assert_eq!(json["completed"], true);

        let back: Todo = serde_json::from_value::<TodoDocument>(json).unwrap().try_into().unwrap();
        assert_eq!(back, todo);
    }

    #[test]
    fn malformed_document_id_is_a_storage_error() {
        let now = Utc::now();
        let doc = TodoDocument {
            id: "nope".into(),
            title: "t".into(),
            description: String::new(),
            completed: false,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(Todo::try_from(doc), Err(TodoError::Storage(_))));
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_through_the_collection() {
        let (_dir, repo) = repo().await;
        let id = repo.insert(create("Task 1")).await.unwrap();
        assert!(!id.is_nil());

        let todo = repo.get_by_id(id).await.unwrap();
        assert_eq!(todo.id, id);
        assert_eq!(todo.title, "Task 1");
        assert_eq!(todo.description, "desc");
        assert!(!todo.completed);
    }

    #[tokio::test]
    async fn empty_collection_lists_nothing() {
        let (_dir, repo) = repo().await;
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn data_outlives_individual_connections() {
        let (_dir, repo) = repo().await;
        repo.insert(create("a")).await.unwrap();
        repo.insert(create("b")).await.unwrap();
        assert_eq!(repo.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_advances_updated_at() {
        let (_dir, repo) = repo().await;
        let id = repo.insert(create("before")).await.unwrap();
        let original = repo.get_by_id(id).await.unwrap();

        repo.update(id, UpdateTodo::new("after", "new", true).unwrap()).await.unwrap();

        let updated = repo.get_by_id(id).await.unwrap();
        assert_eq!(updated.title, "after");
        assert_eq!(updated.description, "new");
        assert!(updated.completed);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_ids_are_not_found() {
        let (_dir, repo) = repo().await;
        let id = TodoId::new();
        assert!(matches!(
            repo.update(id, UpdateTodo::new("x", "", false).unwrap()).await,
            Err(TodoError::NotFound(_))
        ));
        assert!(matches!(repo.delete(id).await, Err(TodoError::NotFound(_))));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_the_document() {
        let (_dir, repo) = repo().await;
        let id = repo.insert(create("gone")).await.unwrap();
        repo.delete(id).await.unwrap();
        assert!(matches!(repo.get_by_id(id).await, Err(TodoError::NotFound(_))));
    }

    #[tokio::test]
    async fn get_all_skips_undecodable_documents() {
        let (_dir, repo) = repo().await;
        repo.insert(create("good")).await.unwrap();

        let mut conn = repo.connect().await.unwrap();
        sqlx::query("INSERT INTO todos (_id, document) VALUES ('bad', '{not json')")
            .execute(&mut conn)
            .await
            .unwrap();
        repo.disconnect(conn).await;

        let todos = repo.get_all().await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "good");
    }
}
