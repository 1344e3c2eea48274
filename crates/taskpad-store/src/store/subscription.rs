//! Live query subscriptions.
//!
//! A [`TaskSubscription`] is a handle over a `tokio::sync::watch` channel
//! carrying fully-materialized, ordered snapshots of one user's partition.
//! It delivers the latest snapshot, never a history and never a diff.
//! Dropping the handle tears down delivery only — in-flight writes still
//! complete against the store.

use std::sync::Arc;

use tokio::sync::watch;

use taskpad_core::task::Task;

/// Which slice of a user's partition a subscription observes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListFilter {
    /// Every task for the user.
    All,
    /// Tasks with `is_completed == false`.
    Active,
    /// Tasks with `is_completed == true`.
    Completed,
}

impl ListFilter {
    /// Whether a task belongs to this view.
    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.is_completed,
            Self::Completed => task.is_completed,
        }
    }
}

/// A live, filtered view of one user's task list.
#[derive(Debug)]
pub struct TaskSubscription {
    rx: watch::Receiver<Arc<Vec<Task>>>,
    filter: ListFilter,
}

impl TaskSubscription {
    pub(crate) fn new(rx: watch::Receiver<Arc<Vec<Task>>>, filter: ListFilter) -> Self {
        Self { rx, filter }
    }

    /// A subscription that is permanently empty (no active user).
    ///
    /// `snapshot()` returns an empty list and [`Self::recv`] returns `None`
    /// immediately.
    #[must_use]
    pub fn empty() -> Self {
        let (tx, rx) = watch::channel(Arc::new(Vec::new()));
        drop(tx);
        Self {
            rx,
            filter: ListFilter::All,
        }
    }

    /// The current snapshot, filtered.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.rx
            .borrow()
            .iter()
            .filter(|t| self.filter.matches(t))
            .cloned()
            .collect()
    }

    /// Wait for the next published snapshot and return it, filtered.
    ///
    /// Returns `None` once the store side of the channel is gone.
    pub async fn recv(&mut self) -> Option<Vec<Task>> {
        self.rx.changed().await.ok()?;
        let snapshot = self
            .rx
            .borrow_and_update()
            .iter()
            .filter(|t| self.filter.matches(t))
            .cloned()
            .collect();
        Some(snapshot)
    }
}
