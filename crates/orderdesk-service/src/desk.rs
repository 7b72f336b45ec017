//! # OrderDesk
//!
//! The facade every caller goes through. Operations live in
//! [`crate::commands`], grouped by area, as `impl OrderDesk` blocks.
//!
//! ## State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderDesk                                                              │
//! │  ├── db: Database            pool handle, cheap to clone                │
//! │  ├── prices: PriceResolver   catalog lookups                            │
//! │  ├── authenticator: A        credentials → Principal                    │
//! │  └── config: ServiceConfig   page sizes, order prefix, retries          │
//! │                                                                         │
//! │  No per-request state is kept between calls; every operation reads      │
//! │  and writes through the database.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::info;

use crate::auth::{Authenticator, SqliteAuthenticator};
use crate::config::ServiceConfig;
use crate::pricing::PriceResolver;
use crate::response::ApiResponse;
use orderdesk_db::{Database, DbResult};

/// Order management operations over one database.
#[derive(Debug, Clone)]
pub struct OrderDesk<A = SqliteAuthenticator> {
    pub(crate) db: Database,
    pub(crate) prices: PriceResolver,
    pub(crate) authenticator: A,
    pub(crate) config: ServiceConfig,
}

/// `health` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub database: bool,
    pub migrations_applied: usize,
    pub migrations_total: usize,
}

impl OrderDesk<SqliteAuthenticator> {
    /// Wraps an open database, authenticating against its `users` table.
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        let authenticator = SqliteAuthenticator::new(db.users());
        OrderDesk::with_authenticator(db, config, authenticator)
    }

    /// Opens the configured database (running migrations) and wraps it.
    pub async fn connect(config: ServiceConfig) -> DbResult<Self> {
        let db = Database::new(config.db_config()).await?;

        info!(
            path = %config.database_path.display(),
            order_prefix = %config.order_prefix,
            "OrderDesk ready"
        );

        Ok(OrderDesk::new(db, config))
    }
}

impl<A: Authenticator> OrderDesk<A> {
    pub fn with_authenticator(db: Database, config: ServiceConfig, authenticator: A) -> Self {
        OrderDesk {
            prices: PriceResolver::new(db.catalog()),
            db,
            authenticator,
            config,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Database reachability and migration state.
    pub async fn health(&self) -> ApiResponse<HealthReport> {
        let database = self.db.health_check().await;
        let status = self.db.migration_status().await;

        let report = match status {
            Ok(s) => HealthReport {
                database,
                migrations_applied: s.applied,
                migrations_total: s.total,
            },
            Err(_) => HealthReport {
                database: false,
                migrations_applied: 0,
                migrations_total: 0,
            },
        };

        let message = if report.database && report.migrations_applied >= report.migrations_total {
            "ok"
        } else {
            "degraded"
        };

        ApiResponse::ok_with_message(report, message)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::desk;

    #[tokio::test]
    async fn test_health_reports_migrations() {
        let desk = desk().await;

        let response = desk.health().await;
        assert_eq!(response.message.as_deref(), Some("ok"));

        let report = response.into_data().unwrap();
        assert!(report.database);
        assert!(report.migrations_total > 0);
        assert_eq!(report.migrations_applied, report.migrations_total);
    }
}
