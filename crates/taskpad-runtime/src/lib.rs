//! # taskpad-runtime
//!
//! The coordination layer between user intents and the task store:
//!
//! - [`tasks::TaskCoordinator`] — owns the active user's live task list,
//!   translates add/toggle/delete/clear intents into store mutations.
//! - [`auth::AuthCoordinator`] — the authentication state machine, holding
//!   a single current [`taskpad_core::auth::AuthState`] value.
//! - [`auth::IdentityProvider`] — the credential-check seam, with a local
//!   `SQLite`-backed implementation in [`auth::LocalIdentityProvider`].
//!
//! ## Crate Position
//!
//! Top of the stack: depends on `taskpad-core` and `taskpad-store`.

#![deny(unsafe_code)]

pub mod auth;
pub mod tasks;
