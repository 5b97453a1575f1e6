//! Persistence port for todos and its adapters.
//!
//! The service talks to storage only through [`TodoStore`]. Reads return the
//! fixed [`Todo`] projection; writes report absence and duplicate ids through
//! [`StoreError`] rather than by pre-checking.

mod memory;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::todo::{NewTodo, Todo};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors surfaced by a store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no todo with id '{id}'")]
    NotFound { id: String },

    #[error("a todo with id '{id}' already exists")]
    Conflict { id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row for todo '{id}': {reason}")]
    CorruptRow { id: String, reason: String },
}

/// A window request against the `created_at DESC, id DESC` ordering.
///
/// With a cursor, the window begins at the cursor record itself. A cursor
/// that names no record yields an empty window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub take: usize,
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Fetch up to `query.take` todos, newest first.
    async fn find_many(&self, query: &PageQuery) -> Result<Vec<Todo>, StoreError>;

    /// Fetch one todo by id.
    async fn find_unique(&self, id: &str) -> Result<Option<Todo>, StoreError>;

    /// Insert a todo and return the stored record.
    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    /// Remove a todo; `NotFound` when nothing was removed.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Set `completed` and `updated_at`; `NotFound` when nothing matched.
    async fn update_completed(
        &self,
        id: &str,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Release any held resources. Called once at shutdown.
    async fn close(&self) {}
}
