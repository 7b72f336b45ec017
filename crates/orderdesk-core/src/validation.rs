//! # Validation Module
//!
//! Entry checks run by every operation before storage is touched.
//!
//! ## Field Limits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Field           Required   Max length                                  │
//! │  ─────────────   ────────   ──────────                                  │
//! │  customer_name   yes        250                                         │
//! │  user_id         yes        30                                          │
//! │  client_id       yes        50                                          │
//! │  product_code    yes        30                                          │
//! │  phone           no         20                                          │
//! │  address         no         500                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, not bytes.
//!
//! ## Amount Limits
//! Quantities stay within ±1,000,000 and unit prices within ±1,000,000,000,
//! so `quantity × unit_price` and its cents always fit `Money` and `i64`.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::CartKey;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_CUSTOMER_NAME_LEN: usize = 250;
pub const MAX_USER_ID_LEN: usize = 30;
pub const MAX_CLIENT_ID_LEN: usize = 50;
pub const MAX_PRODUCT_CODE_LEN: usize = 30;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_ADDRESS_LEN: usize = 500;

pub const MAX_QUANTITY: i64 = 1_000_000;
pub const MAX_UNIT_PRICE: i64 = 1_000_000_000;

// =============================================================================
// String Validators
// =============================================================================

/// Checks a required field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use orderdesk_core::validation::require;
///
/// assert_eq!(require("client_id", " c1 ", 50).unwrap(), "c1");
/// assert!(require("client_id", "  ", 50).is_err());
/// ```
pub fn require(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    check_length(field, value, max)?;
    Ok(value.to_string())
}

/// Checks an optional field; blank input becomes `None`.
pub fn optional(field: &str, value: Option<&str>, max: usize) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            check_length(field, v, max)?;
            Ok(Some(v.to_string()))
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates and trims every part of a cart key.
pub fn validate_cart_key(key: &CartKey) -> ValidationResult<CartKey> {
    Ok(CartKey {
        customer_name: require("customer_name", &key.customer_name, MAX_CUSTOMER_NAME_LEN)?,
        user_id: require("user_id", &key.user_id, MAX_USER_ID_LEN)?,
        client_id: require("client_id", &key.client_id, MAX_CLIENT_ID_LEN)?,
    })
}

pub fn validate_client_id(client_id: &str) -> ValidationResult<String> {
    require("client_id", client_id, MAX_CLIENT_ID_LEN)
}

pub fn validate_product_code(code: &str) -> ValidationResult<String> {
    require("product_code", code, MAX_PRODUCT_CODE_LEN)
}

/// Validates a record id (cart line, order, order line).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<String> {
    require(field, id, 64)
}

// =============================================================================
// Amount Validators
// =============================================================================

/// Checks a quantity (or quantity delta) against `MAX_QUANTITY`.
pub fn validate_quantity(quantity: Money) -> ValidationResult<Money> {
    check_magnitude("quantity", quantity, MAX_QUANTITY)
}

/// Checks a unit price against `MAX_UNIT_PRICE`.
pub fn validate_unit_price(unit_price: Money) -> ValidationResult<Money> {
    check_magnitude("unit_price", unit_price, MAX_UNIT_PRICE)
}

fn check_magnitude(field: &str, value: Money, max: i64) -> ValidationResult<Money> {
    if value > Money::from_int(max) || value < Money::from_int(-max) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -max,
            max,
        });
    }
    Ok(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
