//! Auth state machine.
//!
//! Exactly one [`AuthState`] is current at any instant, held in a
//! `tokio::sync::watch` cell: overwritten, never merged, with subscribers
//! observing only the latest value.
//!
//! Validation failures are reported synchronously — the state never passes
//! through `Loading` for them. Attempts are serialized: a `login` or
//! `register` issued while one is in flight is rejected as a no-op.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use taskpad_core::auth::AuthState;
use taskpad_core::errors::ValidationError;

use super::provider::IdentityProvider;

/// Minimum accepted password length for registration.
const MIN_PASSWORD_LEN: usize = 6;

/// Owns the current [`AuthState`] and serializes login/registration
/// attempts against the identity provider.
pub struct AuthCoordinator {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthState>,
    in_flight: Mutex<()>,
}

impl AuthCoordinator {
    /// Build the coordinator, probing once for an existing session.
    ///
    /// An established session puts the machine straight into `Success`;
    /// otherwise it starts `Idle`.
    pub async fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let initial = match provider.current_user().await {
            Some(user) => {
                debug!(user_id = %user.id, "restored existing session");
                AuthState::Success { user }
            }
            None => AuthState::Idle,
        };
        let (state, _) = watch::channel(initial);
        Self {
            provider,
            state,
            in_flight: Mutex::new(()),
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes. The receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Attempt a login.
    ///
    /// Blank email or password fails synchronously without touching the
    /// provider. Otherwise transitions `Loading` → `Success`/`Error`.
    pub async fn login(&self, email: &str, password: &str) {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("login ignored: another auth attempt is in flight");
            return;
        };

        if email.trim().is_empty() || password.trim().is_empty() {
            self.set(AuthState::Error {
                message: ValidationError::BlankCredentials.to_string(),
            });
            return;
        }

        self.set(AuthState::Loading);
        match self.provider.sign_in(email, password).await {
            Ok(user) => self.set(AuthState::Success { user }),
            Err(e) => self.set(AuthState::Error {
                message: e.to_string(),
            }),
        }
    }

    /// Attempt a registration.
    ///
    /// Validation order is fixed: blank check, then confirmation match,
    /// then minimum length — the first failing check determines the
    /// reported error. Passing all checks transitions
    /// `Loading` → `Success`/`Error`.
    pub async fn register(&self, email: &str, password: &str, confirm: &str) {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("registration ignored: another auth attempt is in flight");
            return;
        };

        if email.trim().is_empty() || password.trim().is_empty() {
            self.set(AuthState::Error {
                message: ValidationError::BlankCredentials.to_string(),
            });
            return;
        }
        if password != confirm {
            self.set(AuthState::Error {
                message: ValidationError::PasswordMismatch.to_string(),
            });
            return;
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            self.set(AuthState::Error {
                message: ValidationError::PasswordTooShort.to_string(),
            });
            return;
        }

        self.set(AuthState::Loading);
        match self.provider.sign_up(email, password).await {
            Ok(user) => self.set(AuthState::Success { user }),
            Err(e) => self.set(AuthState::Error {
                message: e.to_string(),
            }),
        }
    }

    /// Sign out. Always transitions to `Idle` locally, even when the
    /// provider-side sign-out fails (the failure is logged, not surfaced).
    pub async fn logout(&self) {
        if let Err(e) = self.provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed; clearing local state anyway");
        }
        self.set(AuthState::Idle);
    }

    /// Explicit UI-driven reset to `Idle` (e.g. after dismissing an error).
    pub fn reset(&self) {
        self.set(AuthState::Idle);
    }

    fn set(&self, state: AuthState) {
        let _ = self.state.send_replace(state);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
