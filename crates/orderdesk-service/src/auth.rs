//! # Authentication
//!
//! Turns (user id, client id, password) into a [`Principal`] whose role
//! decides order visibility.
//!
//! ```text
//! Credentials ──► trim, all required ──► Authenticator::authenticate
//!                        │                        │
//!                  Missing(field)        ┌────────┴─────────┐
//!                                        │ no match         │ match
//!                                        ▼                  ▼
//!                              InvalidCredentials    role blank? ──► NoRoleAssigned
//!                                                           │
//!                                                           ▼
//!                                          Principal { role: "level3" }
//! ```

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use orderdesk_core::{Principal, Role};
use orderdesk_db::{DbError, UserRepository};

/// Login input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(
        user_id: impl Into<String>,
        client_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Credentials {
            user_id: user_id.into(),
            client_id: client_id.into(),
            password: password.into(),
        }
    }

    /// Trimmed copy; fails on the first blank field.
    pub fn normalized(&self) -> Result<Credentials, AuthError> {
        let field = |name: &'static str, value: &str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(AuthError::Missing(name))
            } else {
                Ok(trimmed.to_string())
            }
        };

        Ok(Credentials {
            user_id: field("user_id", &self.user_id)?,
            client_id: field("client_id", &self.client_id)?,
            password: field("password", &self.password)?,
        })
    }
}

/// Authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    Missing(&'static str),

    /// Unknown user, wrong client or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No role assigned. Contact administrator.")]
    NoRoleAssigned,

    #[error(transparent)]
    Storage(#[from] DbError),
}

/// Source of principals.
pub trait Authenticator: Send + Sync {
    /// `credentials` are already trimmed and non-empty.
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Principal, AuthError>> + Send;
}

/// Authenticator over the `users` table.
#[derive(Debug, Clone)]
pub struct SqliteAuthenticator {
    users: UserRepository,
}

impl SqliteAuthenticator {
    pub fn new(users: UserRepository) -> Self {
        SqliteAuthenticator { users }
    }
}

impl Authenticator for SqliteAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        let user = self
            .users
            .verify(&credentials.user_id, &credentials.client_id, &credentials.password)
            .await?
            .ok_or_else(|| {
                debug!(
                    user_id = %credentials.user_id,
                    client_id = %credentials.client_id,
                    "Login failed"
                );
                AuthError::InvalidCredentials
            })?;

        let role = user.role.as_deref().and_then(Role::normalize).ok_or_else(|| {
            info!(
                user_id = %user.user_id,
                client_id = %user.client_id,
                "Login blocked: no role set"
            );
            AuthError::NoRoleAssigned
        })?;

        Ok(Principal {
            user_id: user.user_id,
            client_id: user.client_id,
            role,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
