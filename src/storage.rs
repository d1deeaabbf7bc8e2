use crate::entities::{Category, NewCategory, NewTask, NewUser, Task, TaskUpdate, User};
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Work", "blue"),
    ("Personal", "green"),
    ("Shopping", "yellow"),
    ("Health", "purple"),
];

/// Storage operations the http layer needs.
///
/// Lookups that miss return `None` (or `false` for deletes); nothing here
/// fails, so there is no error type.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: i64) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    async fn create_user(&self, user: NewUser) -> User;
    /// Like `create_user`, but returns `None` without inserting when the
    /// username is already taken. Check and insert happen under one lock.
    async fn create_user_if_absent(&self, user: NewUser) -> Option<User>;

    async fn get_tasks(&self) -> Vec<Task>;
    async fn get_task(&self, id: i64) -> Option<Task>;
    async fn create_task(&self, task: NewTask) -> Task;
    async fn update_task(&self, id: i64, update: TaskUpdate) -> Option<Task>;
    async fn delete_task(&self, id: i64) -> bool;

    async fn get_categories(&self) -> Vec<Category>;
    async fn create_category(&self, category: NewCategory) -> Category;
}

/// In-memory store. Ids only ever grow, so the `BTreeMap` key order is also
/// insertion order.
pub struct MemStorage {
    inner: Mutex<Collections>,
}

#[derive(Default)]
struct Collections {
    users: BTreeMap<i64, User>,
    tasks: BTreeMap<i64, Task>,
    categories: BTreeMap<i64, Category>,
    next_user_id: IdCounter,
    next_task_id: IdCounter,
    next_category_id: IdCounter,
}

struct IdCounter(i64);

impl Default for IdCounter {
    fn default() -> Self {
        IdCounter(1)
    }
}

impl IdCounter {
    fn next(&mut self) -> i64 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

impl Collections {
    fn insert_user(&mut self, user: NewUser) -> User {
        let id = self.next_user_id.next();
        let user = User {
            id,
            username: user.username,
            password: user.password,
        };
        self.users.insert(id, user.clone());
        user
    }

    fn insert_category(&mut self, category: NewCategory) -> Category {
        let id = self.next_category_id.next();
        let category = Category {
            id,
            name: category.name,
            color: category.color,
        };
        self.categories.insert(id, category.clone());
        category
    }
}

impl MemStorage {
    /// Creates a store holding the four default categories (ids 1 to 4).
    pub fn new() -> Self {
        let mut collections = Collections::default();
        for (name, color) in DEFAULT_CATEGORIES {
            collections.insert_category(NewCategory::new(name, color));
        }
        Self {
            inner: Mutex::new(collections),
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: i64) -> Option<User> {
        self.inner.lock().await.users.get(&id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        let inner = self.inner.lock().await;
        inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    async fn create_user(&self, user: NewUser) -> User {
        self.inner.lock().await.insert_user(user)
    }

    async fn create_user_if_absent(&self, user: NewUser) -> Option<User> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return None;
        }
        Some(inner.insert_user(user))
    }

    // newest first; equal timestamps fall back to the higher id
    async fn get_tasks(&self) -> Vec<Task> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<Task> = inner.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        tasks
    }

    async fn get_task(&self, id: i64) -> Option<Task> {
        self.inner.lock().await.tasks.get(&id).cloned()
    }

    async fn create_task(&self, task: NewTask) -> Task {
        let mut inner = self.inner.lock().await;
        let id = inner.next_task_id.next();
        let now = Utc::now();
        let task = Task {
            id,
            title: task.title,
            description: task.description,
            category: task.category,
            priority: task.priority,
            completed: task.completed,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(id, task.clone());
        task
    }

    async fn update_task(&self, id: i64, update: TaskUpdate) -> Option<Task> {
        let mut inner = self.inner.lock().await;
        let task = inner.tasks.get_mut(&id)?;
        update.apply(task);
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    async fn delete_task(&self, id: i64) -> bool {
        self.inner.lock().await.tasks.remove(&id).is_some()
    }

    async fn get_categories(&self) -> Vec<Category> {
        self.inner
            .lock()
            .await
            .categories
            .values()
            .cloned()
            .collect()
    }

    async fn create_category(&self, category: NewCategory) -> Category {
        self.inner.lock().await.insert_category(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Priority;
    use std::sync::Arc;

    fn task(title: &str) -> NewTask {
        NewTask::new(title, Priority::Medium)
    }

    #[tokio::test]
    async fn seeds_default_categories_in_order() {
        let store = MemStorage::new();
        let categories = store.get_categories().await;

        let seeded: Vec<(i64, &str, &str)> = categories
            .iter()
            .map(|c| (c.id, c.name.as_str(), c.color.as_str()))
            .collect();
        assert_eq!(
            seeded,
            vec![
                (1, "Work", "blue"),
                (2, "Personal", "green"),
                (3, "Shopping", "yellow"),
                (4, "Health", "purple"),
            ]
        );
    }

    #[tokio::test]
    async fn user_categories_continue_after_seed() {
        let store = MemStorage::new();
        let first = store.create_category(NewCategory::new("Errands", "red")).await;
        let second = store.create_category(NewCategory::new("Errands", "red")).await;

        assert_eq!(first.id, 5);
        assert_eq!(second.id, 6);
        let names: Vec<String> = store
            .get_categories()
            .await
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names[4..], ["Errands", "Errands"]);
    }

    #[tokio::test]
    async fn task_ids_are_consecutive_from_one() {
        let store = MemStorage::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.create_task(task(&format!("task {i}"))).await.id);
        }
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = MemStorage::new();
        let first = store.create_task(task("one")).await;
        let second = store.create_task(task("two")).await;
        assert!(store.delete_task(second.id).await);
        assert!(store.delete_task(first.id).await);

        let third = store.create_task(task("three")).await;
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn create_task_passes_fields_through() {
        let store = MemStorage::new();
        let created = store
            .create_task(NewTask {
                title: "Buy milk".into(),
                description: None,
                category: Some("Nonexistent".into()),
                priority: Priority::Low,
                completed: true,
                due_date: Some("2026-11-01".into()),
            })
            .await;

        assert_eq!(created.id, 1);
        assert_eq!(created.title, "Buy milk");
        assert_eq!(created.description, None);
        assert_eq!(created.category.as_deref(), Some("Nonexistent"));
        assert_eq!(created.priority, Priority::Low);
        assert!(created.completed);
        assert_eq!(created.due_date.as_deref(), Some("2026-11-01"));
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(store.get_task(1).await, Some(created));
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let store = MemStorage::new();
        let mut new_task = task("Write report");
        new_task.description = Some("quarterly".into());
        new_task.category = Some("Work".into());
        let before = store.create_task(new_task).await;

        let after = store
            .update_task(
                before.id,
                TaskUpdate {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(after.completed);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.title, before.title);
        assert_eq!(after.description, before.description);
        assert_eq!(after.category, before.category);
        assert_eq!(after.priority, before.priority);
        assert_eq!(after.due_date, before.due_date);
        assert_eq!(store.get_task(before.id).await, Some(after));
    }

    #[tokio::test]
    async fn update_can_clear_optional_fields() {
        let store = MemStorage::new();
        let mut new_task = task("Dentist");
        new_task.category = Some("Health".into());
        new_task.due_date = Some("2026-12-01".into());
        let created = store.create_task(new_task).await;

        let updated = store
            .update_task(
                created.id,
                TaskUpdate {
                    category: Some(None),
                    priority: Some(Priority::High),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.category, None);
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.due_date.as_deref(), Some("2026-12-01"));
    }

    #[tokio::test]
    async fn update_missing_task_has_no_effect() {
        let store = MemStorage::new();
        let existing = store.create_task(task("keep me")).await;

        let result = store
            .update_task(
                9999,
                TaskUpdate {
                    title: Some("ghost".into()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(result, None);
        assert_eq!(store.get_tasks().await, vec![existing]);
        // the miss must not burn a task id
        assert_eq!(store.create_task(task("next")).await.id, 2);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemStorage::new();
        let created = store.create_task(task("temporary")).await;

        assert!(store.delete_task(created.id).await);
        assert!(!store.delete_task(created.id).await);
        assert!(!store.delete_task(42).await);
        assert!(store.get_tasks().await.is_empty());
        assert_eq!(store.get_task(created.id).await, None);
    }

    #[tokio::test]
    async fn tasks_are_listed_newest_first() {
        let store = MemStorage::new();
        for title in ["t1", "t2", "t3"] {
            store.create_task(task(title)).await;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let titles: Vec<String> = store
            .get_tasks()
            .await
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn equal_timestamps_order_by_id_descending() {
        let store = MemStorage::new();
        for title in ["a", "b", "c"] {
            store.create_task(task(title)).await;
        }
        // force a tie regardless of clock resolution
        let stamp = Utc::now();
        for task in store.inner.lock().await.tasks.values_mut() {
            task.created_at = stamp;
        }

        let ids: Vec<i64> = store.get_tasks().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn username_lookup_returns_first_match() {
        let store = MemStorage::new();
        let first = store
            .create_user(NewUser {
                username: "sam".into(),
                password: "one".into(),
            })
            .await;
        let second = store
            .create_user(NewUser {
                username: "sam".into(),
                password: "two".into(),
            })
            .await;

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.get_user_by_username("sam").await, Some(first));
        assert_eq!(store.get_user(2).await, Some(second));
        assert_eq!(store.get_user_by_username("nobody").await, None);
        assert_eq!(store.get_user(3).await, None);
    }

    #[tokio::test]
    async fn create_if_absent_refuses_taken_username() {
        let store = MemStorage::new();
        let user = |name: &str| NewUser {
            username: name.into(),
            password: "pw".into(),
        };

        let first = store.create_user_if_absent(user("sam")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(store.create_user_if_absent(user("sam")).await, None);
        // the refusal must not burn a user id
        assert_eq!(store.create_user_if_absent(user("alex")).await.unwrap().id, 2);
        assert_eq!(store.get_user_by_username("sam").await, Some(first));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_create_if_absent_admits_one() {
        let store: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_user_if_absent(NewUser {
                        username: "dup".into(),
                        password: "pw".into(),
                    })
                    .await
                    .is_some()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.get_user(2).await, None);
    }

    #[tokio::test]
    async fn stores_are_independent() {
        let a = MemStorage::new();
        let b = MemStorage::new();
        a.create_task(task("only in a")).await;

        assert_eq!(a.get_tasks().await.len(), 1);
        assert!(b.get_tasks().await.is_empty());
        assert_eq!(b.create_task(task("b")).await.id, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_ids() {
        let store: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_task(task(&format!("task {i}"))).await.id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=50).collect::<Vec<i64>>());
    }
}
