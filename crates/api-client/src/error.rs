//! Error types for client construction

use algolia_core::{ConfigError, TransportError};
use thiserror::Error;

/// Result type alias for client construction
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised while building or initializing a client
///
/// Operations themselves fail with [`TransportError`]; this type covers
/// everything that happens before the first request.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid or missing configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built
    #[error("HTTP client initialization failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The runtime backing the blocking client could not be started
    #[error("Runtime initialization failed: {0}")]
    Runtime(#[source] std::io::Error),

    /// A global tracing subscriber is already installed
    #[error("Logging initialization failed: {0}")]
    Logging(String),

    /// A request failed
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Whether this is a configuration problem
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
