//! Identity provider seam and the local `SQLite`-backed implementation.
//!
//! [`IdentityProvider`] is what the auth coordinator talks to: a one-shot
//! session probe plus suspending sign-in/sign-up/sign-out calls.
//! [`LocalIdentityProvider`] keeps accounts (unique email, salted SHA-256
//! password hash) and the current session in the same database as the
//! tasks, so an established session survives process restarts.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};

use taskpad_core::auth::AuthUser;
use taskpad_core::ids::UserId;
use taskpad_store::sqlite::connection::ConnectionPool;

use super::errors::AuthError;

/// Credential checking and session tracking, as seen by the coordinator.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The identity of an already-established session, if any.
    async fn current_user(&self) -> Option<AuthUser>;

    /// Verify credentials and establish a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Create an account and establish a session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Tear down the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Local account store: accounts and the single active session.
pub struct LocalIdentityProvider {
    pool: ConnectionPool,
}

impl LocalIdentityProvider {
    /// Wrap a pool and ensure the auth tables exist.
    ///
    /// The auth schema is additive (`IF NOT EXISTS`) and independent of the
    /// task store's `user_version` migrations, so both can share a database.
    pub fn with_pool(pool: ConnectionPool) -> Result<Self, AuthError> {
        {
            let conn = pool.get()?;
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                     id            TEXT PRIMARY KEY,
                     email         TEXT NOT NULL UNIQUE,
                     password_salt TEXT NOT NULL,
                     password_hash TEXT NOT NULL
                 );
                 CREATE TABLE IF NOT EXISTS auth_session (
                     slot    INTEGER PRIMARY KEY CHECK (slot = 0),
                     user_id TEXT NOT NULL REFERENCES users (id) ON DELETE CASCADE
                 );",
            )?;
        }
        Ok(Self { pool })
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T, AuthError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, AuthError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn)
        })
        .await
        .map_err(|e| AuthError::Backend(format!("blocking task panicked: {e}")))?
    }

    fn lookup_session(conn: &Connection) -> Result<Option<AuthUser>, AuthError> {
        let user = conn
            .query_row(
                "SELECT u.id, u.email FROM auth_session s
                 JOIN users u ON u.id = s.user_id WHERE s.slot = 0",
                [],
                |row| {
                    Ok(AuthUser {
                        id: UserId::new(row.get::<_, String>(0)?),
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn establish_session(conn: &Connection, user_id: &UserId) -> Result<(), AuthError> {
        let _ = conn.execute(
            "INSERT OR REPLACE INTO auth_session (slot, user_id) VALUES (0, ?1)",
            params![user_id.as_str()],
        )?;
        Ok(())
    }

    fn hash_password(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex(&hasher.finalize())
    }

    fn generate_salt() -> String {
        hex(&rand::random::<[u8; 16]>())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn is_unique_email_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(msg)) => {
            code.code == rusqlite::ErrorCode::ConstraintViolation && msg.contains("users.email")
        }
        _ => false,
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn current_user(&self) -> Option<AuthUser> {
        self.run_blocking(|conn| Self::lookup_session(conn))
            .await
            .ok()
            .flatten()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.to_string();
        let password = password.to_string();
        self.run_blocking(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, password_salt, password_hash
                     FROM users WHERE email = ?1",
                    params![email],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, email, salt, hash)) = row else {
                return Err(AuthError::InvalidCredentials);
            };
            if Self::hash_password(&salt, &password) != hash {
                return Err(AuthError::InvalidCredentials);
            }

            let user = AuthUser {
                id: UserId::new(id),
                email,
            };
            Self::establish_session(conn, &user.id)?;
            Ok(user)
        })
        .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = email.to_string();
        let password = password.to_string();
        self.run_blocking(move |conn| {
            let user_id = UserId::generate();
            let salt = Self::generate_salt();
            let hash = Self::hash_password(&salt, &password);
            // The UNIQUE constraint on users.email is the authority on
            // duplicates; concurrent sign-ups race to the same INSERT and
            // exactly one wins.
            match conn.execute(
                "INSERT INTO users (id, email, password_salt, password_hash)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id.as_str(), email, salt, hash],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_email_violation(&e) => {
                    return Err(AuthError::EmailTaken);
                }
                Err(e) => return Err(e.into()),
            }

            let user = AuthUser {
                id: user_id,
                email,
            };
            Self::establish_session(conn, &user.id)?;
            Ok(user)
        })
        .await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.run_blocking(|conn| {
            let _ = conn.execute("DELETE FROM auth_session WHERE slot = 0", [])?;
            Ok(())
        })
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
