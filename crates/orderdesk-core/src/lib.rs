//! # orderdesk-core: Pure Business Logic for OrderDesk
//!
//! Money math, price-tier selection and consolidation rules, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OrderDesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                  orderdesk-service (surface)                    │    │
//! │  │   add_item, get_cart, place_order, list_orders_for, ...         │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │              ★ orderdesk-core (THIS CRATE) ★                    │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌─────────────────┐    │    │
//! │  │   │  money   │ │  types   │ │ pricing  │ │  consolidation  │    │    │
//! │  │   │  Money   │ │ Cart     │ │ PriceTier│ │  DiscountRatio  │    │    │
//! │  │   │  scales  │ │ Order    │ │ Batch    │ │  merge rules    │    │    │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └─────────────────┘    │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                  orderdesk-db (SQLite layer)                    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money` with half-up quantization
//! - [`types`] - Carts, orders, reference data, listing filters
//! - [`pricing`] - Price tiers and the fallback rule
//! - [`consolidation`] - Discount ratios and line merge accumulation
//! - [`validation`] - Entry checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use orderdesk_core::consolidation::ConsolidationPlan;
//! use orderdesk_core::{CartLine, Money};
//!
//! let line = CartLine {
//!     id: "cl-1".into(),
//!     cart_id: "cart-1".into(),
//!     product_code: "P-1".into(),
//!     product_name: "Rice 5kg".into(),
//!     quantity: Money::from_int(1),
//!     unit_price: Money::parse("100.00").unwrap(),
//! };
//!
//! let plan = ConsolidationPlan::from_cart_lines(&[line], Money::from_int(20));
//! assert_eq!(plan.lines[0].line_total.to_string(), "80.00");
//! assert_eq!(plan.lines[0].discount_pct.to_string(), "20.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod consolidation;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PriceTier, ProductBatch};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Customer name used when a cart request names none.
pub const DEFAULT_CUSTOMER_NAME: &str = "Guest";
