//! Task intents: the coordinator between the UI and the store.

pub mod coordinator;

pub use coordinator::TaskCoordinator;
