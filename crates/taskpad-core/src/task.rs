//! Core task types.
//!
//! Serializable types use `camelCase` for wire compatibility with the
//! clients that render them. A [`Task`] is the persisted unit of data:
//! owned by exactly one user, sorted by its immutable creation timestamp,
//! mutated only by whole-row replacement.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Default priority.
    Medium,
    /// Elevated priority.
    High,
}

impl Priority {
    /// SQL string representation (matches the `SQLite` CHECK constraint values).
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse the SQL string representation back into a priority.
    #[must_use]
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A persisted task row.
///
/// `id == 0` means the task has not been persisted yet; the store assigns
/// a real id on first insertion. `timestamp` is Unix millis, set once at
/// construction, and is the descending sort key for every listing query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned identifier (0 = not yet persisted).
    pub id: i64,
    /// Non-empty display title.
    pub title: String,
    /// Priority level.
    pub priority: Priority,
    /// Creation time in Unix millis. Immutable after construction.
    pub timestamp: i64,
    /// Completion flag.
    pub is_completed: bool,
    /// Owning account.
    pub user_id: UserId,
}

impl Task {
    /// Build a new unpersisted task stamped with the current time.
    pub fn new(title: impl Into<String>, priority: Priority, user_id: UserId) -> Self {
        Self {
            id: 0,
            title: title.into(),
            priority,
            timestamp: Utc::now().timestamp_millis(),
            is_completed: false,
            user_id,
        }
    }

    /// Full copy with the completion flag flipped.
    ///
    /// Mutation is whole-row replacement; other components never see a
    /// partially updated field.
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }
}

/// Per-user task counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// All tasks for the user.
    pub total: i64,
    /// Tasks with the completion flag set.
    pub completed: i64,
    /// Tasks still open.
    pub pending: i64,
}
