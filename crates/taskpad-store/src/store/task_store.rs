//! High-level transactional `TaskStore`.
//!
//! Every write runs inside a single `SQLite` transaction and, once
//! committed, republishes a fully-materialized ordered snapshot to the
//! affected user's subscribers before the call returns — callers never
//! observe partial state, and a snapshot either includes a write entirely
//! or not at all.
//!
//! INVARIANT: writes are serialized per user partition via in-process
//! mutex locks (`with_user_write_lock`), so writes against one user's
//! partition apply in issue order. Writes for different users carry no
//! mutual ordering guarantee.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tracing::{debug, instrument};

use taskpad_core::ids::UserId;
use taskpad_core::task::{Task, TaskSummary};

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{ConnectionPool, PooledConnection, open_pool};
use crate::sqlite::repositories::task::TaskRepo;
use crate::store::subscription::{ListFilter, TaskSubscription};

type Snapshot = Arc<Vec<Task>>;

/// Durable task store with live per-user snapshot publication.
pub struct TaskStore {
    pool: ConnectionPool,
    user_write_locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
    publishers: Mutex<HashMap<String, watch::Sender<Snapshot>>>,
}

impl TaskStore {
    const SQLITE_BUSY_MAX_RETRIES: u32 = 32;

    /// Open (or create) a store at the given database path.
    pub fn open(path: &Path, pool_size: u32, busy_timeout_ms: u32) -> Result<Self> {
        Ok(Self::with_pool(open_pool(path, pool_size, busy_timeout_ms)?))
    }

    /// Wrap an already-opened pool (migrations must have run).
    pub fn with_pool(pool: ConnectionPool) -> Self {
        Self {
            pool,
            user_write_locks: Mutex::new(HashMap::new()),
            publishers: Mutex::new(HashMap::new()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Subscribe to a live, filtered view of one user's partition.
    ///
    /// The subscription is seeded with the current snapshot; every
    /// committed write affecting the user delivers a refreshed one.
    pub fn subscribe(&self, user_id: &UserId, filter: ListFilter) -> Result<TaskSubscription> {
        let mut publishers = self
            .publishers
            .lock()
            .map_err(|_| StoreError::Internal("publisher map poisoned".into()))?;

        if let Some(tx) = publishers.get(user_id.as_str()) {
            return Ok(TaskSubscription::new(tx.subscribe(), filter));
        }

        let conn = self.conn()?;
        let seed: Snapshot = Arc::new(TaskRepo::list_all(&conn, user_id)?);
        let (tx, rx) = watch::channel(seed);
        let _ = publishers.insert(user_id.to_string(), tx);
        Ok(TaskSubscription::new(rx, filter))
    }

    /// Fetch a task by id.
    pub fn get(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.conn()?;
        TaskRepo::get_by_id(&conn, id)
    }

    /// Per-user task counts.
    pub fn summary(&self, user_id: &UserId) -> Result<TaskSummary> {
        let conn = self.conn()?;
        TaskRepo::count_summary(&conn, user_id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// Insert a task (upsert-by-id). Returns the stored row with its id.
    #[instrument(skip(self, task), fields(user_id = %task.user_id))]
    pub fn insert(&self, task: &Task) -> Result<Task> {
        if task.user_id.is_empty() {
            return Err(StoreError::Internal(
                "refusing to persist task with empty user_id".into(),
            ));
        }
        let stored = self.write(&task.user_id, |conn| TaskRepo::insert(conn, task))?;
        counter!("taskstore_inserts_total").increment(1);
        debug!(task_id = stored.id, "task inserted");
        Ok(stored)
    }

    /// Replace the row matching `task.id`. No-op (returns `false`) if the
    /// row no longer exists.
    #[instrument(skip(self, task), fields(task_id = task.id, user_id = %task.user_id))]
    pub fn update(&self, task: &Task) -> Result<bool> {
        let changed = self.write(&task.user_id, |conn| TaskRepo::update(conn, task))?;
        counter!("taskstore_updates_total").increment(1);
        Ok(changed)
    }

    /// Delete the row matching `task.id`. No-op if already absent.
    #[instrument(skip(self, task), fields(task_id = task.id, user_id = %task.user_id))]
    pub fn delete(&self, task: &Task) -> Result<bool> {
        let removed = self.write(&task.user_id, |conn| TaskRepo::delete(conn, task.id))?;
        counter!("taskstore_deletes_total").increment(1);
        Ok(removed)
    }

    /// Remove every row for a user in one transaction.
    ///
    /// Atomic with respect to concurrent readers: a snapshot shows either
    /// the full partition or none of it.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub fn delete_all_for_user(&self, user_id: &UserId) -> Result<usize> {
        let removed = self.write(user_id, |conn| TaskRepo::delete_all_for_user(conn, user_id))?;
        counter!("taskstore_clears_total").increment(1);
        debug!(removed, "partition cleared");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Run one transactional write under the user's partition lock, then
    /// republish the partition snapshot before releasing the lock (keeps
    /// published snapshots in write order).
    fn write<T>(&self, user_id: &UserId, op: impl Fn(&rusqlite::Connection) -> Result<T>) -> Result<T> {
        let user_lock = self.acquire_user_write_lock(user_id)?;
        let _guard = user_lock
            .lock()
            .map_err(|_| StoreError::Internal("user write lock poisoned".into()))?;

        let value = self.retry_on_sqlite_busy(|| {
            let conn = self.conn()?;
            let tx = conn.unchecked_transaction()?;
            let value = op(&tx)?;
            tx.commit()?;
            Ok(value)
        })?;

        self.republish(user_id)?;
        Ok(value)
    }

    /// Push a fresh snapshot to the user's publisher, if anyone subscribed.
    fn republish(&self, user_id: &UserId) -> Result<()> {
        let mut publishers = self
            .publishers
            .lock()
            .map_err(|_| StoreError::Internal("publisher map poisoned".into()))?;

        let Some(tx) = publishers.get(user_id.as_str()) else {
            return Ok(());
        };
        if tx.receiver_count() == 0 {
            // Last subscriber is gone; drop the channel and stop querying.
            let _ = publishers.remove(user_id.as_str());
            counter!("taskstore_publishes_dropped_total").increment(1);
            return Ok(());
        }

        let conn = self.conn()?;
        let snapshot: Snapshot = Arc::new(TaskRepo::list_all(&conn, user_id)?);
        let _ = tx.send_replace(snapshot);
        Ok(())
    }

    fn acquire_user_write_lock(&self, user_id: &UserId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .user_write_locks
            .lock()
            .map_err(|_| StoreError::Internal("user lock map poisoned".into()))?;

        // Opportunistically prune dead weak refs when the map grows.
        if locks.len() > 128 {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }

        if let Some(existing) = locks.get(user_id.as_str()).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        let lock = Arc::new(Mutex::new(()));
        let _ = locks.insert(user_id.to_string(), Arc::downgrade(&lock));
        Ok(lock)
    }

    /// Retry an operation on `SQLite` BUSY/LOCKED with linear backoff + jitter.
    #[allow(clippy::unused_self)]
    fn retry_on_sqlite_busy<T>(&self, mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempts = 0;

        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err)
                    if Self::is_sqlite_busy_or_locked(&err)
                        && attempts < Self::SQLITE_BUSY_MAX_RETRIES =>
                {
                    attempts += 1;
                    let base_ms = u64::from(attempts).saturating_mul(10).min(500);
                    let jitter_range = base_ms / 4;
                    let jitter = if jitter_range > 0 {
                        rand::random::<u64>() % (jitter_range * 2 + 1)
                    } else {
                        0
                    };
                    let backoff_ms = base_ms.saturating_sub(jitter_range) + jitter;
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_sqlite_busy_or_locked(err: &StoreError) -> bool {
        match err {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => {
                matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
            }
            _ => false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use taskpad_core::task::Priority;

    fn setup() -> (tempfile::TempDir, TaskStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open(&dir.path().join("tasks.db"), 4, 5_000).unwrap();
        (dir, store)
    }

    fn make_task(title: &str, user: &str, timestamp: i64) -> Task {
        Task {
            id: 0,
            title: title.to_string(),
            priority: Priority::Medium,
            timestamp,
            is_completed: false,
            user_id: UserId::new(user),
        }
    }

    #[test]
    fn insert_assigns_id_and_persists() {
        let (_dir, store) = setup();
        let stored = store.insert(&make_task("Buy milk", "user_1", 100)).unwrap();
        assert!(stored.id > 0);
        let fetched = store.get(stored.id).unwrap().unwrap();
        assert_eq!(fetched, stored);
    }

    #[test]
    fn insert_rejects_empty_user() {
        let (_dir, store) = setup();
        let result = store.insert(&make_task("orphan", "", 100));
        assert!(matches!(result, Err(StoreError::Internal(_))));
    }

    #[tokio::test]
    async fn failed_write_leaves_subscription_on_last_committed_state() {
        let (_dir, store) = setup();
        let user = UserId::new("user_1");
        let mut sub = store.subscribe(&user, ListFilter::All).unwrap();

        let stored = store.insert(&make_task("committed", "user_1", 100)).unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        // A rejected write errors out but the live view keeps the
        // last committed snapshot.
        assert!(store.insert(&make_task("orphan", "", 200)).is_err());
        let snapshot = sub.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, stored.id);

        // And the subscription still delivers subsequent good writes.
        let _ = store.insert(&make_task("after", "user_1", 300)).unwrap();
        assert_eq!(sub.recv().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn subscribe_seeds_current_snapshot() {
        let (_dir, store) = setup();
        let user = UserId::new("user_1");
        store.insert(&make_task("existing", "user_1", 100)).unwrap();

        let sub = store.subscribe(&user, ListFilter::All).unwrap();
        let snapshot = sub.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].title, "existing");
    }

    #[tokio::test]
    async fn writes_publish_refreshed_snapshots() {
        let (_dir, store) = setup();
        let user = UserId::new("user_1");
        let mut sub = store.subscribe(&user, ListFilter::All).unwrap();

        let stored = store.insert(&make_task("Walk dog", "user_1", 100)).unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        store.update(&stored.toggled()).unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert!(snapshot[0].is_completed);

        store.delete(&stored).unwrap();
        let snapshot = sub.recv().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn filtered_views_partition_the_snapshot() {
        let (_dir, store) = setup();
        let user = UserId::new("user_1");
        let active = store.subscribe(&user, ListFilter::Active).unwrap();
        let completed = store.subscribe(&user, ListFilter::Completed).unwrap();

        let a = store.insert(&make_task("open", "user_1", 100)).unwrap();
        let b = store.insert(&make_task("done", "user_1", 200)).unwrap();
        store.update(&b.toggled()).unwrap();

        let active_snap = active.snapshot();
        let completed_snap = completed.snapshot();
        assert_eq!(active_snap.len(), 1);
        assert_eq!(active_snap[0].id, a.id);
        assert_eq!(completed_snap.len(), 1);
        assert_eq!(completed_snap[0].id, b.id);
    }

    #[tokio::test]
    async fn toggle_then_delete_never_resurrects() {
        let (_dir, store) = setup();
        let user = UserId::new("user_1");
        let sub = store.subscribe(&user, ListFilter::All).unwrap();

        let stored = store.insert(&make_task("doomed", "user_1", 100)).unwrap();
        // Toggle and delete issued back to back, same vended record
        store.update(&stored.toggled()).unwrap();
        store.delete(&stored).unwrap();

        assert!(sub.snapshot().is_empty());
        assert!(store.get(stored.id).unwrap().is_none());
        // A late update against the deleted row stays a no-op
        assert!(!store.update(&stored.toggled()).unwrap());
        assert!(sub.snapshot().is_empty());
    }

    #[tokio::test]
    async fn clear_only_touches_one_partition() {
        let (_dir, store) = setup();
        let alice = UserId::new("user_alice");
        let bob = UserId::new("user_bob");
        store.insert(&make_task("a1", "user_alice", 100)).unwrap();
        store.insert(&make_task("a2", "user_alice", 200)).unwrap();
        store.insert(&make_task("b1", "user_bob", 300)).unwrap();

        let alice_sub = store.subscribe(&alice, ListFilter::All).unwrap();
        let bob_sub = store.subscribe(&bob, ListFilter::All).unwrap();

        let removed = store.delete_all_for_user(&alice).unwrap();
        assert_eq!(removed, 2);
        assert!(alice_sub.snapshot().is_empty());
        assert_eq!(bob_sub.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn snapshots_never_leak_across_users() {
        let (_dir, store) = setup();
        let alice = UserId::new("user_alice");
        store.insert(&make_task("mine", "user_alice", 100)).unwrap();
        store.insert(&make_task("theirs", "user_bob", 200)).unwrap();

        let sub = store.subscribe(&alice, ListFilter::All).unwrap();
        assert!(
            sub.snapshot()
                .iter()
                .all(|t| t.user_id.as_str() == "user_alice")
        );
    }

    #[tokio::test]
    async fn dropped_subscription_does_not_block_writes() {
        let (_dir, store) = setup();
        let user = UserId::new("user_1");
        let sub = store.subscribe(&user, ListFilter::All).unwrap();
        drop(sub);

        // Write still completes; publisher is pruned on the next write.
        let stored = store.insert(&make_task("still works", "user_1", 100)).unwrap();
        assert!(store.get(stored.id).unwrap().is_some());

        // A fresh subscription sees the committed row.
        let sub = store.subscribe(&user, ListFilter::All).unwrap();
        assert_eq!(sub.snapshot().len(), 1);
    }

    #[test]
    fn summary_counts_per_user() {
        let (_dir, store) = setup();
        let user = UserId::new("user_1");
        let a = store.insert(&make_task("a", "user_1", 100)).unwrap();
        store.insert(&make_task("b", "user_1", 200)).unwrap();
        store.update(&a.toggled()).unwrap();

        let summary = store.summary(&user).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.pending, 1);
    }

    #[tokio::test]
    async fn interleaved_writes_for_two_users_stay_isolated() {
        let (_dir, store) = setup();
        let alice = UserId::new("user_alice");
        let bob = UserId::new("user_bob");
        let alice_sub = store.subscribe(&alice, ListFilter::All).unwrap();
        let bob_sub = store.subscribe(&bob, ListFilter::All).unwrap();

        for i in 0..5 {
            store.insert(&make_task(&format!("a{i}"), "user_alice", i)).unwrap();
            store.insert(&make_task(&format!("b{i}"), "user_bob", i)).unwrap();
        }

        assert_eq!(alice_sub.snapshot().len(), 5);
        assert_eq!(bob_sub.snapshot().len(), 5);
    }
}
