//! `SQLite` persistence: connections, migrations, and row repositories.

pub mod connection;
pub mod migrations;
pub mod repositories;
