//! Branded ID newtypes.
//!
//! `UserId` wraps the account identifier every store query and mutation is
//! scoped by. An empty `UserId` is representable (it is the transient
//! "nobody signed in" value) but must never reach the store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owning account identifier for persisted tasks.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier (`user_` + UUIDv7).
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("user_{}", Uuid::now_v7()))
    }

    /// Whether this is the transient "no user" value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
