use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PageQuery, StoreError, TodoStore};
use crate::todo::{NewTodo, Todo};

/// Process-local store backed by a map. Data is lost on restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    todos: Arc<RwLock<HashMap<String, Todo>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_key(todo: &Todo) -> Reverse<(DateTime<Utc>, &str)> {
    Reverse((todo.created_at, todo.id.as_str()))
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn find_many(&self, query: &PageQuery) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.read().await;
        let mut ordered: Vec<&Todo> = todos.values().collect();
        ordered.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));

        let start = match &query.cursor {
            None => 0,
            Some(cursor) => match ordered.iter().position(|t| &t.id == cursor) {
                Some(index) => index,
                None => return Ok(Vec::new()),
            },
        };

        Ok(ordered
            .into_iter()
            .skip(start)
            .take(query.take)
            .cloned()
            .collect())
    }

    async fn find_unique(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        Ok(self.todos.read().await.get(id).cloned())
    }

    async fn create(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let id = todo.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut todos = self.todos.write().await;
        if todos.contains_key(&id) {
            return Err(StoreError::Conflict { id });
        }
        let stored = Todo {
            id: id.clone(),
            title: todo.title,
            completed: todo.completed,
            created_at: todo.now,
            updated_at: todo.now,
        };
        todos.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.todos
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn update_completed(
        &self,
        id: &str,
        completed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut todos = self.todos.write().await;
        let todo = todos
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        todo.completed = completed;
        todo.updated_at = updated_at;
        Ok(())
    }
}
