//! # User Repository
//!
//! Credentials and raw role strings. Passwords are stored as argon2 PHC
//! strings and never leave this module in plain form.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// A user whose password has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: String,
    pub client_id: String,
    /// As stored; normalization happens in the service layer.
    pub role: Option<String>,
}

#[derive(Debug, FromRow)]
struct CredentialRow {
    user_id: String,
    client_id: String,
    role: Option<String>,
    password_hash: String,
}

/// Repository for users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates or replaces a user, hashing the password.
    pub async fn upsert(
        &self,
        user_id: &str,
        client_id: &str,
        password: &str,
        role: Option<&str>,
    ) -> DbResult<()> {
        let password_hash = hash_password(password)?;

        debug!(user_id = %user_id, client_id = %client_id, "Upserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, client_id, password_hash, role)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (client_id, id) DO UPDATE SET
                password_hash = excluded.password_hash,
                role = excluded.role
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns the user when the id, client and password all match.
    ///
    /// Unknown users and wrong passwords both give `None`.
    pub async fn verify(
        &self,
        user_id: &str,
        client_id: &str,
        password: &str,
    ) -> DbResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id AS user_id, client_id, role, password_hash
            FROM users
            WHERE id = ?1 AND client_id = ?2
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .filter(|r| verify_password(password, &r.password_hash))
            .map(|r| UserRecord {
                user_id: r.user_id,
                client_id: r.client_id,
                role: r.role,
            }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against its stored hash.
fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
