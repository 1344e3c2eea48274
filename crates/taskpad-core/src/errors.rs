//! Shared validation errors.
//!
//! Validation failures are detected synchronously and never reach the
//! store. Each variant carries the exact message surfaced to the caller.

/// A synchronously detected input problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Task title was empty or whitespace.
    #[error("Title cannot be empty")]
    BlankTitle,

    /// Email or password was empty.
    #[error("Email and password cannot be empty")]
    BlankCredentials,

    /// Registration password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Registration password below the minimum length.
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}
