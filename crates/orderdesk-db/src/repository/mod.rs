//! # Repository Module
//!
//! Database repository implementations for OrderDesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  orderdesk-service                                                      │
//! │       │                                                                 │
//! │       │  db.carts().add_item(&key, &contact, &line)                     │
//! │       ▼                                                                 │
//! │  CartRepository / OrderRepository / CatalogRepository / ...             │
//! │       │                                                                 │
//! │       │  Row structs (integer minor units) ⇄ domain types (Money)       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Products and price batches
//! - [`customer::CustomerRepository`] - Synced and manual customers
//! - [`user::UserRepository`] - Credentials and roles
//! - [`cart::CartRepository`] - Carts keyed by (customer, user, client)
//! - [`order::OrderRepository`] - Orders, consolidation and line edits

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod user;

use orderdesk_core::money::{Money, CURRENCY_SCALE, QUANTITY_SCALE};
use uuid::Uuid;

use crate::error::DbResult;

/// Generates a new record ID.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Currency value → cents.
pub(crate) fn to_cents(value: Money) -> DbResult<i64> {
    Ok(value.to_minor_units(CURRENCY_SCALE)?)
}

/// Quantity or batch tier → thousandths.
pub(crate) fn to_milli(value: Money) -> DbResult<i64> {
    Ok(value.to_minor_units(QUANTITY_SCALE)?)
}

pub(crate) fn from_cents(cents: i64) -> Money {
    Money::from_minor_units(cents, CURRENCY_SCALE)
}

pub(crate) fn from_milli(milli: i64) -> Money {
    Money::from_minor_units(milli, QUANTITY_SCALE)
}
