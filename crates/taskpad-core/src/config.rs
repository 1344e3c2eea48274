//! Configuration with compiled defaults and optional file override.
//!
//! Unlike server deployments there is nothing to hot-reload here, so the
//! config is a plain value: [`TaskpadConfig::default()`] for the compiled
//! defaults, [`TaskpadConfig::load_from_path`] to merge a JSON file over
//! them. Missing fields in the file keep their defaults; a missing or
//! unreadable file falls back to defaults entirely.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Runtime configuration for the tracker core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskpadConfig {
    /// Path of the `SQLite` database file.
    pub db_path: PathBuf,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// `SQLite` busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for TaskpadConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("taskpad.db"),
            pool_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

impl TaskpadConfig {
    /// Load config from a JSON file, merging over compiled defaults.
    ///
    /// Falls back to [`TaskpadConfig::default()`] when the file is missing
    /// or unparseable, logging the problem instead of failing startup.
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, ?path, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, ?path, "failed to read config file, using defaults");
                Self::default()
            }
        }
    }
}
