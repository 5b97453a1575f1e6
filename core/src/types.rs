//! Domain DTOs for the todo procedures.
//!
//! # Design
//! These mirror the server's wire shapes but are defined independently so
//! the client does not link the server's axum and sqlx stack. The
//! integration test catches any drift between the two crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A todo as returned by `todo.byId`, `todo.add` and `todo.list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for `todo.list`. Both fields are optional; the server defaults the
/// limit to 50.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTodos {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Output of `todo.list`. Pass `next_cursor` back as `cursor` to continue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoPage {
    pub items: Vec<Todo>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Input for `todo.add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Input for `todo.toggle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleTodo {
    pub id: String,
    pub completed: bool,
}
