//! Structured logging setup
//!
//! The client only emits `tracing` events; installing a subscriber is left
//! to the application. [`init`] is a convenience for binaries and tests.

use crate::error::{ClientError, ClientResult};
use algolia_core::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set
    pub log_level: String,
    /// Show event targets
    pub show_target: bool,
    /// Show thread IDs
    pub show_thread_ids: bool,
    /// Emit JSON lines instead of compact text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_target: false,
            show_thread_ids: false,
            json: false,
        }
    }
}

impl From<&ClientConfig> for LogConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            log_level: config.log_level.clone(),
            ..Self::default()
        }
    }
}

/// Install a global subscriber
///
/// `RUST_LOG` takes precedence over `config.log_level`. Fails if a global
/// subscriber is already set.
pub fn init(config: &LogConfig) -> ClientResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids),
            )
            .try_init()
    };

    result.map_err(|e| ClientError::Logging(e.to_string()))?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_from_client_config() {
        let config = ClientConfig::new("APPID", "key").with_log_level("debug");
        let log = LogConfig::from(&config);
        assert_eq!(log.log_level, "debug");
        assert!(!log.json);
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig {
            log_level: "warn".to_string(),
            ..LogConfig::default()
        };
        let _ = init(&config);
        assert!(matches!(init(&config), Err(ClientError::Logging(_))));
    }
}
