//! # orderdesk-db: Database Layer for OrderDesk
//!
//! SQLite storage for carts, orders and the tenant reference data they are
//! priced from. All multi-statement work runs inside a single sqlx
//! transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OrderDesk Data Flow                              │
//! │                                                                         │
//! │  OrderDesk::place_order (orderdesk-service)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 orderdesk-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐   │    │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │   │    │
//! │  │   │               │    │ CartRepo       │    │              │   │    │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │    │ 001_initial  │   │    │
//! │  │   │ WAL, FKs on   │    │ CatalogRepo    │    │ _schema.sql  │   │    │
//! │  │   │               │    │ Customer/User  │    │              │   │    │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (ORDERDESK_DB_PATH)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orderdesk_db::{Database, DbConfig, PlaceOrderOptions};
//!
//! let db = Database::new(DbConfig::new("orderdesk.db")).await?;
//!
//! let cart = db.carts().get(&key).await?;
//! let order = db
//!     .orders()
//!     .place_order(&key, discount, None, &PlaceOrderOptions::default())
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::{CartRepository, NewCartLine};
pub use repository::catalog::CatalogRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::{OrderPage, OrderRepository, PlaceOrderOptions};
pub use repository::user::{hash_password, UserRecord, UserRepository};
