//! Async repository façade over [`TaskStore`].
//!
//! [`TaskRepository`] is the contract the coordinators program against:
//! writes suspend while durable storage completes, list queries hand back
//! a long-lived subscription instead of suspending per call. The blanket
//! implementation moves pooled `SQLite` work onto the blocking thread pool.

use std::sync::Arc;

use async_trait::async_trait;

use taskpad_core::ids::UserId;
use taskpad_core::task::{Task, TaskSummary};

use crate::errors::{Result, StoreError};
use crate::store::subscription::{ListFilter, TaskSubscription};
use crate::store::task_store::TaskStore;

/// Store contract consumed by the coordinators.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a task (upsert-by-id); returns the stored row with its id.
    async fn insert(&self, task: Task) -> Result<Task>;

    /// Replace the row matching `task.id`; `false` if it no longer exists.
    async fn update(&self, task: Task) -> Result<bool>;

    /// Delete the row matching `task.id`; `false` if already absent.
    async fn delete(&self, task: Task) -> Result<bool>;

    /// Remove every row for a user; returns the removed count.
    async fn delete_all_for_user(&self, user_id: UserId) -> Result<usize>;

    /// Per-user task counts.
    async fn summary(&self, user_id: UserId) -> Result<TaskSummary>;

    /// Open a live, filtered view of one user's partition. Does not
    /// suspend; snapshots are delivered through the returned handle.
    fn subscribe(&self, user_id: &UserId, filter: ListFilter) -> Result<TaskSubscription>;
}

/// [`TaskRepository`] backed by a pooled [`TaskStore`].
#[derive(Clone)]
pub struct SqliteTaskRepository {
    store: Arc<TaskStore>,
}

impl SqliteTaskRepository {
    /// Wrap a shared store.
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<TaskStore>) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store))
            .await
            .map_err(|e| StoreError::Internal(format!("blocking task panicked: {e}")))?
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: Task) -> Result<Task> {
        self.run_blocking(move |store| store.insert(&task)).await
    }

    async fn update(&self, task: Task) -> Result<bool> {
        self.run_blocking(move |store| store.update(&task)).await
    }

    async fn delete(&self, task: Task) -> Result<bool> {
        self.run_blocking(move |store| store.delete(&task)).await
    }

    async fn delete_all_for_user(&self, user_id: UserId) -> Result<usize> {
        self.run_blocking(move |store| store.delete_all_for_user(&user_id))
            .await
    }

    async fn summary(&self, user_id: UserId) -> Result<TaskSummary> {
        self.run_blocking(move |store| store.summary(&user_id)).await
    }

    fn subscribe(&self, user_id: &UserId, filter: ListFilter) -> Result<TaskSubscription> {
        self.store.subscribe(user_id, filter)
    }
}
