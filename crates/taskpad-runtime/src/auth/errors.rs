//! Auth error types.
//!
//! Any failure from the identity provider surfaces as
//! `AuthState::Error(message)` — never silently swallowed. Variant display
//! strings are the messages shown to the user.

/// Failures from the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Registration against an email that already has an account.
    #[error("An account with this email already exists")]
    EmailTaken,

    /// The provider's own storage or transport failed.
    #[error("authentication backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<r2d2::Error> for AuthError {
    fn from(e: r2d2::Error) -> Self {
        Self::Backend(e.to_string())
    }
}
