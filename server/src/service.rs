//! The todo access service: five operations, one store call each.

use std::sync::Arc;

use mockable::Clock;
use tracing::debug;

use crate::error::ServiceError;
use crate::input::{AddInput, IdInput, ListInput, ToggleInput};
use crate::store::{PageQuery, TodoStore};
use crate::todo::{NewTodo, Todo, TodoPage};

/// Stateless facade over an injected store and clock.
///
/// Cloning is cheap; clones share the same store handle.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn TodoStore> {
        &self.store
    }

    /// Return one page of todos.
    ///
    /// The store is asked for `limit + 1` rows newest-first. When the extra
    /// row arrives it is dropped from the page and its id becomes
    /// `next_cursor`, so the next call starts exactly there. The remaining
    /// window is then reversed, which puts each page oldest-first.
    pub async fn list(&self, input: ListInput) -> Result<TodoPage, ServiceError> {
        let query = PageQuery {
            cursor: input.cursor,
            take: input.limit + 1,
        };
        let mut items = self.store.find_many(&query).await?;

        let mut next_cursor = None;
        if items.len() > input.limit {
            next_cursor = items.pop().map(|todo| todo.id);
        }
        items.reverse();

        debug!(
            returned = items.len(),
            has_more = next_cursor.is_some(),
            "listed todos"
        );
        Ok(TodoPage { items, next_cursor })
    }

    pub async fn by_id(&self, input: IdInput) -> Result<Todo, ServiceError> {
        self.store
            .find_unique(&input.id)
            .await?
            .ok_or(ServiceError::NotFound { id: input.id })
    }

    pub async fn add(&self, input: AddInput) -> Result<Todo, ServiceError> {
        let todo = self
            .store
            .create(NewTodo {
                id: input.id,
                title: input.title,
                completed: input.completed,
                now: self.clock.utc(),
            })
            .await?;
        debug!(id = %todo.id, "created todo");
        Ok(todo)
    }

    pub async fn delete(&self, input: IdInput) -> Result<(), ServiceError> {
        self.store.delete(&input.id).await?;
        debug!(id = %input.id, "deleted todo");
        Ok(())
    }

    pub async fn toggle(&self, input: ToggleInput) -> Result<(), ServiceError> {
        self.store
            .update_completed(&input.id, input.completed, self.clock.utc())
            .await?;
        debug!(id = %input.id, completed = input.completed, "toggled todo");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
    use rstest::rstest;
    use std::sync::Mutex;

    struct StepClock(Mutex<DateTime<Utc>>);

    impl StepClock {
        fn new() -> Self {
            Self(Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
        }
    }

    // Each reading moves time forward one second so creation order is
    // strictly increasing.
    impl Clock for StepClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            let mut now = self.0.lock().unwrap();
            let current = *now;
            *now += TimeDelta::seconds(1);
            current
        }
    }

    fn service() -> TodoService {
        TodoService::new(Arc::new(MemoryStore::new()), Arc::new(StepClock::new()))
    }

    fn add_input(title: &str) -> AddInput {
        AddInput {
            id: None,
            title: title.to_string(),
            completed: false,
        }
    }

    fn titles(page: &TodoPage) -> Vec<&str> {
        page.items.iter().map(|t| t.title.as_str()).collect()
    }

    async fn seeded(titles: &[&str]) -> TodoService {
        let svc = service();
        for title in titles {
            svc.add(add_input(title)).await.unwrap();
        }
        svc
    }

    #[tokio::test]
    async fn list_window_is_reversed_with_extra_row_as_cursor() {
        // A is oldest, C newest.
        let svc = seeded(&["A", "B", "C"]).await;

        let first = svc
            .list(ListInput { limit: 2, cursor: None })
            .await
            .unwrap();
        assert_eq!(titles(&first), ["B", "C"]);

        let a = svc.list(ListInput::default()).await.unwrap().items[0].clone();
        assert_eq!(a.title, "A");
        assert_eq!(first.next_cursor.as_deref(), Some(a.id.as_str()));

        let second = svc
            .list(ListInput { limit: 2, cursor: first.next_cursor })
            .await
            .unwrap();
        assert_eq!(titles(&second), ["A"]);
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn list_without_overflow_has_no_cursor() {
        let svc = seeded(&["A", "B"]).await;
        let page = svc.list(ListInput { limit: 2, cursor: None }).await.unwrap();
        assert_eq!(titles(&page), ["A", "B"]);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn list_on_empty_store() {
        let page = service().list(ListInput::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn list_with_deleted_cursor_is_empty_not_error() {
        let svc = seeded(&["A", "B", "C"]).await;
        let first = svc.list(ListInput { limit: 1, cursor: None }).await.unwrap();
        let cursor = first.next_cursor.clone().unwrap();
        svc.delete(IdInput { id: cursor.clone() }).await.unwrap();

        let page = svc
            .list(ListInput { limit: 1, cursor: Some(cursor) })
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(7)]
    #[case(100)]
    #[tokio::test]
    async fn chained_pages_visit_every_todo_once(#[case] limit: usize) {
        let names: Vec<String> = (0..7).map(|i| format!("todo-{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let svc = seeded(&refs).await;

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = svc.list(ListInput { limit, cursor }).await.unwrap();
            assert!(page.items.len() <= limit);
            seen.extend(page.items.into_iter().map(|t| t.title));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        seen.sort();
        let mut expected = names.clone();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn by_id_returns_stored_fields() {
        let svc = service();
        let created = svc.add(add_input("Walk dog")).await.unwrap();
        let fetched = svc.by_id(IdInput { id: created.id.clone() }).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn by_id_missing_is_not_found_naming_the_id() {
        let err = service()
            .by_id(IdInput { id: "ghost".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(&err, ServiceError::NotFound { id } if id == "ghost"));
        assert!(err.to_string().contains("'ghost'"));
    }

    #[tokio::test]
    async fn add_assigns_id_and_equal_timestamps() {
        let todo = service().add(add_input("Buy milk")).await.unwrap();
        assert!(uuid::Uuid::parse_str(&todo.id).is_ok());
        assert_eq!(todo.created_at, todo.updated_at);
        assert!(!todo.completed);
    }

    #[tokio::test]
    async fn add_with_existing_id_conflicts() {
        let svc = service();
        let id = "6f1c1c1e-2b4e-4a59-9d7e-0c4f3d2a1b00".to_string();
        let input = AddInput {
            id: Some(id.clone()),
            title: "first".to_string(),
            completed: true,
        };
        let created = svc.add(input.clone()).await.unwrap();
        assert_eq!(created.id, id);
        assert!(created.completed);

        let err = svc.add(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict { id: dup } if dup == id));
    }

    #[tokio::test]
    async fn toggle_changes_completed_and_advances_updated_at() {
        let svc = service();
        let before = svc.add(add_input("Walk dog")).await.unwrap();
        svc.toggle(ToggleInput { id: before.id.clone(), completed: true })
            .await
            .unwrap();

        let after = svc.by_id(IdInput { id: before.id.clone() }).await.unwrap();
        assert!(after.completed);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.title, before.title);
    }

    #[tokio::test]
    async fn toggle_missing_is_not_found() {
        let err = service()
            .toggle(ToggleInput { id: "ghost".to_string(), completed: true })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_then_by_id_is_not_found() {
        let svc = service();
        let todo = svc.add(add_input("Gone soon")).await.unwrap();
        svc.delete(IdInput { id: todo.id.clone() }).await.unwrap();

        let err = svc.by_id(IdInput { id: todo.id.clone() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err = svc.delete(IdInput { id: todo.id }).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
