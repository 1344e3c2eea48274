//! Authentication: state machine, provider seam, local provider.

pub mod coordinator;
pub mod errors;
pub mod provider;

pub use coordinator::AuthCoordinator;
pub use errors::AuthError;
pub use provider::{IdentityProvider, LocalIdentityProvider};
