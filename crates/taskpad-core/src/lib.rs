//! # taskpad-core
//!
//! Foundation types, errors, and configuration for the taskpad tracker.
//!
//! This crate provides the shared vocabulary the other taskpad crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::UserId`] as a newtype
//! - **Tasks**: [`task::Task`] rows, [`task::Priority`], [`task::TaskSummary`]
//! - **Auth**: [`auth::AuthState`] sum type and [`auth::AuthUser`]
//! - **Errors**: [`errors::ValidationError`] via `thiserror`
//! - **Config**: [`config::TaskpadConfig`] with compiled defaults
//! - **Logging**: [`logging::init_logging`] tracing setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `taskpad-store` and `taskpad-runtime`.

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod task;
