//! Stepped schema migrations keyed by `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::debug;

use crate::errors::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// Apply any outstanding migrations.
///
/// Idempotent: reads `user_version`, applies each later step in order, and
/// bumps the version inside the same batch so a partially applied step is
/// never recorded as done.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if version < 1 {
        conn.execute_batch(
            "BEGIN;
             CREATE TABLE IF NOT EXISTS tasks (
                 id           INTEGER PRIMARY KEY AUTOINCREMENT,
                 title        TEXT    NOT NULL,
                 priority     TEXT    NOT NULL CHECK (priority IN ('low', 'medium', 'high')),
                 timestamp    INTEGER NOT NULL,
                 is_completed INTEGER NOT NULL DEFAULT 0,
                 user_id      TEXT    NOT NULL CHECK (user_id <> '')
             );
             CREATE INDEX IF NOT EXISTS idx_tasks_user_timestamp
                 ON tasks (user_id, timestamp DESC);
             PRAGMA user_version = 1;
             COMMIT;",
        )?;
        debug!(from = version, to = 1, "applied schema migration");
    }

    Ok(())
}
