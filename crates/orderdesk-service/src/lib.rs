//! # orderdesk-service: Operation Surface for OrderDesk
//!
//! [`OrderDesk`] is the single entry point for callers. Each operation takes
//! a request value, validates it, runs one storage operation and answers
//! with an [`ApiResponse`] envelope. Failures never escape as `Err`.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  caller ──► OrderDesk::add_item(&AddItemRequest)                        │
//! │                 │                                                       │
//! │                 ├── validate (orderdesk-core::validation)               │
//! │                 ├── PriceResolver::resolve  (tenant-scoped catalog)     │
//! │                 ├── CartRepository::add_item (atomic increment)         │
//! │                 ▼                                                       │
//! │             ApiResponse { success, message | error + code, payload }    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`desk`] - The `OrderDesk` facade and health report
//! - [`commands`] - Cart, order, customer and session operations
//! - [`pricing`] - Product and price-record lookup
//! - [`auth`] - Credentials, `Authenticator` and the SQLite implementation
//! - [`request`] - Request payloads
//! - [`response`] / [`error`] - The envelope and its error half
//! - [`config`] / [`telemetry`] - Environment configuration and tracing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orderdesk_service::{telemetry, OrderDesk, ServiceConfig};
//!
//! let config = ServiceConfig::load()?;
//! telemetry::init(&config.log_filter);
//!
//! let desk = OrderDesk::connect(config).await?;
//! let response = desk.place_order(&request).await;
//! println!("{}", serde_json::to_string(&response)?);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod commands;
pub mod config;
pub mod desk;
pub mod error;
pub mod pricing;
pub mod request;
pub mod response;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use auth::{AuthError, Authenticator, Credentials, SqliteAuthenticator};
pub use config::{ConfigError, ServiceConfig};
pub use desk::{HealthReport, OrderDesk};
pub use error::{ApiError, ErrorCode};
pub use pricing::{PriceQuote, PriceResolver};
pub use request::{
    AddItemRequest, CartRef, ListOrdersRequest, NewCustomerRequest, NumericInput,
    PlaceOrderRequest, PriceQuery,
};
pub use response::ApiResponse;

#[cfg(test)]
pub(crate) mod testing;
