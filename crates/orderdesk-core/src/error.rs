//! # Error Types
//!
//! Domain-specific error types for orderdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orderdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule failures                          │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  orderdesk-db errors                                                    │
//! │  └── DbError          - Storage failures (wraps CoreError as Domain)    │
//! │                                                                         │
//! │  orderdesk-service errors                                               │
//! │  └── ApiError         - What callers see inside the response envelope   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → envelope      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No product with this code exists in any tenant.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product exists but has no price record and no explicit price was
    /// supplied.
    #[error("No price record for product: {0}")]
    PriceNotFound(String),

    /// The record exists, but under another tenant.
    ///
    /// ## Boundary Behavior
    /// Surfaced to callers as not-found so that the existence of another
    /// tenant's data is never revealed. `owner` is kept for logs only.
    #[error("{entity} {code} is not available for client {requested}")]
    TenantMismatch {
        entity: String,
        code: String,
        requested: String,
        owner: String,
    },

    /// No cart exists for the (customer, user, client) key.
    #[error("Cart not found for customer '{customer_name}'")]
    CartNotFound { customer_name: String },

    /// Cart line id does not exist.
    #[error("Cart item not found: {0}")]
    CartLineNotFound(String),

    /// Order id does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Order line id does not exist.
    #[error("Order item not found: {0}")]
    OrderLineNotFound(String),

    /// Explicit merge target is missing, owned by someone else, or not pending.
    ///
    /// ## When This Occurs
    /// ```text
    /// place_order(cart, 10%, merge_into = "ord-42")
    ///      │
    ///      ▼
    /// ord-42 status = completed
    ///      │
    ///      ▼
    /// InvalidMergeTarget { order_id: "ord-42", reason: "order is completed" }
    /// ```
    #[error("Cannot merge into order {order_id}: {reason}")]
    InvalidMergeTarget { order_id: String, reason: String },

    /// Status value is not one of pending, completed, cancelled.
    #[error("Invalid status '{0}'. Choose pending, completed, or cancelled")]
    InvalidStatus(String),

    /// A numeric field could not be parsed or does not fit in storage.
    #[error("Invalid numeric input: '{0}'")]
    InvalidNumericInput(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for every variant that callers should see as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_)
                | CoreError::PriceNotFound(_)
                | CoreError::TenantMismatch { .. }
                | CoreError::CartNotFound { .. }
                | CoreError::CartLineNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::OrderLineNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the entry of each operation, before any storage is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidMergeTarget {
            order_id: "ord-1".to_string(),
            reason: "order is completed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot merge into order ord-1: order is completed"
        );

        let err = CoreError::InvalidStatus("shipped".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid status 'shipped'. Choose pending, completed, or cancelled"
        );
    }

    #[test]
    fn test_tenant_mismatch_message_omits_owner() {
        let err = CoreError::TenantMismatch {
            entity: "Product".to_string(),
            code: "P-1".to_string(),
            requested: "client-b".to_string(),
            owner: "client-a".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("client-b"));
        assert!(!message.contains("client-a"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(validation_err.to_string(), "customer_name is required");

        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
    }
}
