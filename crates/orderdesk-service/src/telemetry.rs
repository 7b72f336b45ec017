//! Tracing setup.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages from every crate
//! - `RUST_LOG=orderdesk_db=trace` - Trace for the storage layer only
//! - Otherwise the configured filter (`ORDERDESK_LOG`, default `info,sqlx=warn`)

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// Returns `false` when a subscriber was already installed (tests, or an
/// embedding application that configured its own).
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init("debug");
        assert!(!init("debug"));
    }
}
