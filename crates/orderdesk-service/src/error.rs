//! # API Error Type
//!
//! The error half of every response envelope.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in OrderDesk                              │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──► DbError::Domain ──┐                  │
//! │                                                      │                  │
//! │  sqlx::Error ─────────────────────► DbError ─────────┤                  │
//! │                                                      ▼                  │
//! │  AuthError ──────────────────────────────────────► ApiError             │
//! │                                                      │                  │
//! │                                                      ▼                  │
//! │               ApiResponse { success: false, error, code }               │
//! │                                                                         │
//! │  Storage internals are logged and replaced by a generic message.        │
//! │  Tenant mismatches are reported as plain not-found.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{error, warn};

use crate::auth::AuthError;
use orderdesk_core::{CoreError, ValidationError};
use orderdesk_db::DbError;

/// A failure as callers see it.
///
/// ```json
/// { "code": "NOT_FOUND", "message": "Order not found: 4f1c..." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes carried in failed envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate or conflicting state (409)
    Conflict,

    /// Bad credentials (401)
    Unauthorized,

    /// Authenticated but not permitted (403)
    Forbidden,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status equivalent.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => ApiError::from(e),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::internal("Internal error")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(code) => ApiError::not_found("Product", &code),
            CoreError::TenantMismatch {
                entity,
                code,
                requested,
                owner,
            } => {
                warn!(
                    entity = %entity,
                    code = %code,
                    requested = %requested,
                    owner = %owner,
                    "Cross-tenant lookup rejected"
                );
                ApiError::not_found(&entity, &code)
            }
            CoreError::InvalidMergeTarget { .. } => ApiError::conflict(err.to_string()),
            CoreError::InvalidStatus(_) | CoreError::InvalidNumericInput(_) => {
                ApiError::validation(err.to_string())
            }
            CoreError::Validation(e) => ApiError::from(e),
            CoreError::PriceNotFound(_)
            | CoreError::CartNotFound { .. }
            | CoreError::CartLineNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::OrderLineNotFound(_) => ApiError::new(ErrorCode::NotFound, err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                ApiError::new(ErrorCode::Unauthorized, err.to_string())
            }
            AuthError::NoRoleAssigned => ApiError::new(ErrorCode::Forbidden, err.to_string()),
            AuthError::Missing(_) => ApiError::validation(err.to_string()),
            AuthError::Storage(e) => ApiError::from(e),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_mismatch_is_plain_not_found() {
        let err = ApiError::from(CoreError::TenantMismatch {
            entity: "Product".to_string(),
            code: "P-1".to_string(),
            requested: "client-b".to_string(),
            owner: "client-a".to_string(),
        });

        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: P-1");
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELEC"));
    }

    #[test]
    fn test_domain_errors_unwrap_through_db_error() {
        let err = ApiError::from(DbError::Domain(CoreError::InvalidMergeTarget {
            order_id: "o-1".to_string(),
            reason: "order is completed".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.http_status(), 409);

        let err = ApiError::from(DbError::duplicate("customer name", "Acme"));
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, "customer name 'Acme' already exists");
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::ValidationError).unwrap();
        assert_eq!(json, "\"VALIDATION_ERROR\"");
    }
}
