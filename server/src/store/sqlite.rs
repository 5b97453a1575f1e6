use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::debug;
use uuid::Uuid;

use super::{PageQuery, StoreError, TodoStore};
use crate::todo::{NewTodo, Todo};

/// SQLite-backed store. Timestamps are kept as microseconds since the epoch
/// so that ordering in SQL matches ordering in Rust.
///
/// Every statement names its columns explicitly; `SELECT *` would leak any
/// column added to the table later.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: String,
    title: String,
    completed: bool,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<TodoRow> for Todo {
    type Error = StoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let created_at = from_micros(&row.id, row.created_at)?;
        let updated_at = from_micros(&row.id, row.updated_at)?;
        Ok(Todo {
            id: row.id,
            title: row.title,
            completed: row.completed,
            created_at,
            updated_at,
        })
    }
}

fn from_micros(id: &str, micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros).ok_or_else(|| StoreError::CorruptRow {
        id: id.to_string(),
        reason: format!("timestamp {micros} out of range"),
    })
}

fn map_write_error(error: sqlx::Error, id: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            debug!(id, "duplicate todo id");
            return StoreError::Conflict { id: id.to_string() };
        }
    }
    StoreError::Database(error)
}

impl SqliteStore {
    /// Open a pool against `url` and apply pending migrations.
    ///
    /// In-memory databases (`sqlite::memory:`) only persist for the life of a
    /// connection, so callers should pass `max_connections = 1` for them.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying pending migrations.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn find_many(&self, query: &PageQuery) -> Result<Vec<Todo>, StoreError> {
        let take = i64::try_from(query.take).unwrap_or(i64::MAX);
        let rows = match &query.cursor {
            None => {
                sqlx::query_as::<_, TodoRow>(
                    "SELECT id, title, completed, created_at, updated_at FROM todos \
                     ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(take)
                .fetch_all(&self.pool)
                .await?
            }
            Some(cursor) => {
                // The join against an empty anchor yields no rows for a
                // cursor that no longer exists.
                sqlx::query_as::<_, TodoRow>(
                    "WITH anchor AS (SELECT created_at, id FROM todos WHERE id = ?) \
                     SELECT t.id, t.title, t.completed, t.created_at, t.updated_at \
                     FROM todos t, anchor a \
                     WHERE t.created_at < a.created_at \
                        OR (t.created_at = a.created_at AND t.id <= a.id) \
                     ORDER BY t.created_at DESC, t.id DESC LIMIT ?",
                )
                .bind(cursor.as_str())
                .bind(take)
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Todo::try_from).collect()
    }

    async fn find_unique(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, completed, created_at, updated_at FROM todos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Todo::try_from)
        .transpose()
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let id = todo.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = todo.now.timestamp_micros();
        let row = sqlx::query_as::<_, TodoRow>(
            "INSERT INTO todos (id, title, completed, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, title, completed, created_at, updated_at",
        )
        .bind(id.as_str())
        .bind(todo.title.as_str())
        .bind(todo.completed)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &id))?;
        Todo::try_from(row)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn update_completed(
        &self,
        id: &str,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE todos SET completed = ?, updated_at = ? WHERE id = ?")
            .bind(completed)
            .bind(updated_at.timestamp_micros())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
