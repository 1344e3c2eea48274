//! Authentication state types.
//!
//! [`AuthState`] is a closed sum type with exactly four members. Exactly
//! one state is current at any instant; subscribers observe only the
//! latest value, never a history. Consumers are expected to match
//! exhaustively.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// An authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    /// Account identifier used to scope store queries.
    pub id: UserId,
    /// Email the account was registered with.
    pub email: String,
}

/// Current authentication state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum AuthState {
    /// No in-flight operation, no confirmed user.
    Idle,
    /// A login or registration attempt is in flight.
    Loading,
    /// An authenticated identity is held.
    Success {
        /// The signed-in identity.
        user: AuthUser,
    },
    /// The last operation failed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl AuthState {
    /// Whether an operation is currently in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Success { user } => Some(user),
            _ => None,
        }
    }

    /// The active scoping key: the user id when signed in, `None` otherwise.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user().map(|u| &u.id)
    }
}
