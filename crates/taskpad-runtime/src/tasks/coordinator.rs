//! Task coordinator — user intents against the active user's partition.
//!
//! The coordinator is the single source of the live list subscribers
//! observe. It holds the active user id explicitly (re-derived from every
//! auth state change to `Success`/`Idle`) rather than reading ambient
//! sign-in state. With no active user the published list is empty and no
//! query or mutation ever carries an empty user id.
//!
//! Each mutation is awaited before the call returns, so a caller issuing
//! writes back to back gets them applied to its partition in issue order.

use std::sync::Arc;

use tracing::debug;

use taskpad_core::auth::AuthState;
use taskpad_core::ids::UserId;
use taskpad_core::task::{Priority, Task, TaskSummary};
use taskpad_store::{ListFilter, Result, TaskRepository, TaskSubscription};

/// Mediates between user intents and the task repository.
pub struct TaskCoordinator {
    repo: Arc<dyn TaskRepository>,
    active_user: Option<UserId>,
}

impl TaskCoordinator {
    /// Build a coordinator scoped to the given user (or to nobody).
    pub fn new(repo: Arc<dyn TaskRepository>, active_user: Option<UserId>) -> Self {
        Self { repo, active_user }
    }

    /// The currently active user, if any.
    #[must_use]
    pub fn active_user(&self) -> Option<&UserId> {
        self.active_user.as_ref()
    }

    /// Re-scope to a different user (or to nobody). Existing subscriptions
    /// keep observing the partition they were opened on; callers re-query
    /// [`Self::tasks`] after a scope change.
    pub fn set_active_user(&mut self, user: Option<UserId>) {
        self.active_user = user;
    }

    /// Re-derive the scope from an auth state change. `Success` adopts the
    /// signed-in user, `Idle` clears the scope, `Loading`/`Error` leave it
    /// untouched.
    pub fn apply_auth_state(&mut self, state: &AuthState) {
        match state {
            AuthState::Success { user } => self.set_active_user(Some(user.id.clone())),
            AuthState::Idle => self.set_active_user(None),
            AuthState::Loading | AuthState::Error { .. } => {}
        }
    }

    /// The live task list for the active user, newest first.
    ///
    /// With no active user this is a permanently empty subscription — no
    /// query is issued with an empty user identifier.
    pub fn tasks(&self) -> Result<TaskSubscription> {
        self.tasks_filtered(ListFilter::All)
    }

    /// A filtered live view (`All`/`Active`/`Completed`).
    pub fn tasks_filtered(&self, filter: ListFilter) -> Result<TaskSubscription> {
        match &self.active_user {
            Some(user) => self.repo.subscribe(user, filter),
            None => Ok(TaskSubscription::empty()),
        }
    }

    /// Create and persist a task stamped with the current time.
    ///
    /// Blank titles are dropped silently (deliberate policy — the intent
    /// is discarded, not reported). Returns the stored task, or `None`
    /// when the intent was dropped (blank title or no active user).
    pub async fn add_task(&self, title: &str, priority: Priority) -> Result<Option<Task>> {
        if title.trim().is_empty() {
            debug!("dropping add intent with blank title");
            return Ok(None);
        }
        let Some(user) = &self.active_user else {
            debug!("dropping add intent with no active user");
            return Ok(None);
        };

        let task = Task::new(title, priority, user.clone());
        let stored = self.repo.insert(task).await?;
        Ok(Some(stored))
    }

    /// Flip the completion flag on a previously vended task.
    ///
    /// The update is a full copy-with-change; if the row was deleted in
    /// the meantime the update is a no-op and the task stays gone.
    pub async fn toggle_completion(&self, task: &Task) -> Result<bool> {
        self.repo.update(task.toggled()).await
    }

    /// Delete a previously vended task.
    pub async fn delete_task(&self, task: &Task) -> Result<bool> {
        self.repo.delete(task.clone()).await
    }

    /// Delete every task belonging to the active user. No-op without one.
    pub async fn clear_all(&self) -> Result<usize> {
        match &self.active_user {
            Some(user) => self.repo.delete_all_for_user(user.clone()).await,
            None => Ok(0),
        }
    }

    /// Task counts for the active user (all zero without one).
    pub async fn summary(&self) -> Result<TaskSummary> {
        match &self.active_user {
            Some(user) => self.repo.summary(user.clone()).await,
            None => Ok(TaskSummary::default()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
