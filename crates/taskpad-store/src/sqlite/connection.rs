//! Pooled `SQLite` connections.
//!
//! Every connection is initialized with WAL journaling (concurrent readers
//! while a writer commits), foreign keys, and a busy timeout so short lock
//! contention resolves inside `SQLite` before the store-level retry kicks in.

use std::path::Path;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::Result;
use crate::sqlite::migrations::run_migrations;

/// Shared connection pool handle.
pub type ConnectionPool = r2d2::Pool<SqliteConnectionManager>;

/// A connection checked out of the pool.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Default busy timeout applied to every connection.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

/// Open a pool against a database file, running migrations on the way up.
pub fn open_pool(path: &Path, pool_size: u32, busy_timeout_ms: u32) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {busy_timeout_ms};
             PRAGMA synchronous = NORMAL;"
        ))
    });
    let pool = r2d2::Pool::builder().max_size(pool_size).build(manager)?;
    {
        let conn = pool.get()?;
        run_migrations(&conn)?;
    }
    Ok(pool)
}

/// Open a standalone in-memory connection with migrations applied.
///
/// Repository unit tests use this; pools cannot share an in-memory
/// database across connections, so pooled tests go through a temp file.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    run_migrations(&conn)?;
    Ok(conn)
}
