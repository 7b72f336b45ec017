//! Service configuration.
//!
//! Loaded from `ORDERDESK_*` environment variables with fallback to defaults.
//!
//! | Variable                        | Default             |
//! |---------------------------------|---------------------|
//! | `ORDERDESK_DB_PATH`             | `./orderdesk.db`    |
//! | `ORDERDESK_DB_MAX_CONNECTIONS`  | `5`                 |
//! | `ORDERDESK_DB_BUSY_TIMEOUT_MS`  | `5000`              |
//! | `ORDERDESK_DEFAULT_PAGE_SIZE`   | `20`                |
//! | `ORDERDESK_MAX_PAGE_SIZE`       | `100`               |
//! | `ORDERDESK_ORDER_PREFIX`        | `ORD`               |
//! | `ORDERDESK_PLACE_ORDER_ATTEMPTS`| `3`                 |
//! | `ORDERDESK_LOG`                 | `info,sqlx=warn`    |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use orderdesk_core::consolidation::DEFAULT_ORDER_PREFIX;
use orderdesk_core::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use orderdesk_db::{DbConfig, PlaceOrderOptions};

/// OrderDesk service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long a writer waits for the SQLite lock
    pub busy_timeout: Duration,

    /// Page size when the caller gives none
    pub default_page_size: u32,

    /// Upper bound for caller-supplied page sizes
    pub max_page_size: u32,

    /// Prefix of generated order numbers
    pub order_prefix: String,

    /// Attempts for `place_order` when a unique constraint rejects it
    pub place_order_attempts: u32,

    /// `tracing` filter directive (overridden by `RUST_LOG`)
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            database_path: PathBuf::from("./orderdesk.db"),
            max_connections: 5,
            busy_timeout: Duration::from_millis(5000),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            order_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            place_order_attempts: 3,
            log_filter: "info,sqlx=warn".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            database_path: lookup("ORDERDESK_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "ORDERDESK_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout: Duration::from_millis(parse_or(
                &lookup,
                "ORDERDESK_DB_BUSY_TIMEOUT_MS",
                5000u64,
            )?),

            default_page_size: parse_or(&lookup, "ORDERDESK_DEFAULT_PAGE_SIZE", defaults.default_page_size)?,

            max_page_size: parse_or(&lookup, "ORDERDESK_MAX_PAGE_SIZE", defaults.max_page_size)?,

            order_prefix: lookup("ORDERDESK_ORDER_PREFIX").unwrap_or(defaults.order_prefix),

            place_order_attempts: parse_or(
                &lookup,
                "ORDERDESK_PLACE_ORDER_ATTEMPTS",
                defaults.place_order_attempts,
            )?,

            log_filter: lookup("ORDERDESK_LOG").unwrap_or(defaults.log_filter),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("ORDERDESK_DB_MAX_CONNECTIONS".to_string()));
        }
        if self.max_page_size == 0 || self.default_page_size == 0 {
            return Err(ConfigError::InvalidValue("ORDERDESK_MAX_PAGE_SIZE".to_string()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::InvalidValue("ORDERDESK_DEFAULT_PAGE_SIZE".to_string()));
        }
        if self.place_order_attempts == 0 {
            return Err(ConfigError::InvalidValue("ORDERDESK_PLACE_ORDER_ATTEMPTS".to_string()));
        }
        if self.order_prefix.trim().is_empty() {
            return Err(ConfigError::MissingRequired("ORDERDESK_ORDER_PREFIX".to_string()));
        }
        Ok(())
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(self.busy_timeout)
    }

    /// `place_order` settings derived from this configuration.
    pub fn place_order_options(&self) -> PlaceOrderOptions {
        PlaceOrderOptions {
            order_prefix: self.order_prefix.clone(),
            max_attempts: self.place_order_attempts,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.place_order_options(), PlaceOrderOptions::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("ORDERDESK_DB_PATH", "/tmp/od.db"),
            ("ORDERDESK_MAX_PAGE_SIZE", "50"),
            ("ORDERDESK_ORDER_PREFIX", "SO"),
            ("ORDERDESK_PLACE_ORDER_ATTEMPTS", " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/od.db"));
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.place_order_options().order_prefix, "SO");
        assert_eq!(config.place_order_options().max_attempts, 5);
        assert_eq!(config.db_config().database_path, PathBuf::from("/tmp/od.db"));
    }

    #[test]
    fn test_invalid_values() {
        let err = ServiceConfig::from_lookup(lookup(&[("ORDERDESK_MAX_PAGE_SIZE", "lots")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for ORDERDESK_MAX_PAGE_SIZE");

        assert!(ServiceConfig::from_lookup(lookup(&[("ORDERDESK_DEFAULT_PAGE_SIZE", "500")])).is_err());
        assert!(ServiceConfig::from_lookup(lookup(&[("ORDERDESK_PLACE_ORDER_ATTEMPTS", "0")])).is_err());
    }
}
