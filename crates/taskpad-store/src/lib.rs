//! # taskpad-store
//!
//! Durable, queryable task storage with live per-user snapshot queries.
//!
//! Layered the same way top to bottom:
//!
//! - [`sqlite::connection`] — pooled `SQLite` connections (WAL, busy timeout)
//! - [`sqlite::migrations`] — `PRAGMA user_version` stepped schema migrations
//! - [`sqlite::repositories`] — stateless row-level CRUD (`&Connection` in,
//!   rows out)
//! - [`store`] — transactional [`store::TaskStore`] with per-user write
//!   serialization and snapshot publication, plus the async
//!   [`store::TaskRepository`] façade the coordinators program against
//!
//! Every write runs inside a single transaction and, once committed,
//! republishes a fully-materialized ordered snapshot to that user's
//! subscribers — callers never observe partial state.

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use store::subscription::{ListFilter, TaskSubscription};
pub use store::task_store::TaskStore;
pub use store::repository::{SqliteTaskRepository, TaskRepository};
