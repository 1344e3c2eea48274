//! Store error types.

/// Errors from the task store.
///
/// The only store-level failure kind the rest of the system reacts to is
/// "the storage medium is unavailable"; everything here is recoverable by
/// retrying the originating write. A failed write never corrupts live
/// subscriptions, which keep reflecting the last committed state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying `SQLite` failure (disk full, corruption, constraint).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool exhausted or closed.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Invariant violation inside the store itself.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Store result alias.
pub type Result<T> = std::result::Result<T, StoreError>;
