//! The todo record as it crosses the service boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored todo, restricted to the fields the API exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields handed to the store when creating a todo.
///
/// `id` is optional; the store generates a v4 UUID when it is absent. `now`
/// becomes both `created_at` and `updated_at`.
#[derive(Clone, Debug)]
pub struct NewTodo {
    pub id: Option<String>,
    pub title: String,
    pub completed: bool,
    pub now: DateTime<Utc>,
}

/// One page of todos plus the id that starts the following page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPage {
    pub items: Vec<Todo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}
