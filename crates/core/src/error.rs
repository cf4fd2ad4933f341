//! Error types for the transport layer
//!
//! Every failure is classified once, where it originates, into a variant of
//! [`TransportError`]. The retry strategy then decides what to do with it by
//! matching on the variant.

use thiserror::Error;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Kind of network-level failure reported by the HTTP requester
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    /// The attempt exceeded its time budget
    Timeout,
    /// The connection could not be established (DNS, refused, TLS)
    Connect,
    /// The connection dropped or the exchange failed midway
    Network,
}

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// The network call could not be completed
    #[error("Request failed ({kind:?}): {message}")]
    Request {
        /// What went wrong at the network level
        kind: RequestErrorKind,
        /// Description from the underlying client
        message: String,
    },

    /// The server answered with a non-2xx status
    #[error("HTTP error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Http {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error payload, if any
        message: Option<String>,
    },

    /// Every candidate host was tried without success
    #[error("No reachable hosts ({} attempts failed)", .intermediate_errors.len())]
    NoReachableHosts {
        /// Errors of every attempt, in the order they happened
        intermediate_errors: Vec<TransportError>,
    },

    /// A successful response carried no body
    #[error("Response contained no data")]
    MissingData,

    /// A successful response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decoding(#[from] serde_json::Error),

    /// The request could not be built locally
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// A configured host does not form a valid URL
    #[error("Invalid host URL {url}: {reason}")]
    BadHost {
        /// Offending host URL
        url: String,
        /// Parser message
        reason: String,
    },

    /// The faceting merge received no responses
    #[error("Cannot merge an empty list of responses")]
    EmptyResponses,

    /// The faceting merge received a different number of responses than
    /// queries were sent
    #[error("Expected {expected} faceting responses, received {received}")]
    ResponseCountMismatch {
        /// Queries sent
        expected: usize,
        /// Responses received
        received: usize,
    },
}

impl TransportError {
    /// Create a network-level error
    pub fn request(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self::Request {
            kind,
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http(status: u16, message: Option<String>) -> Self {
        Self::Http { status, message }
    }

    /// Create a malformed request error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest(message.into())
    }

    /// Create a bad host error
    pub fn bad_host(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadHost {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is a timeout (network timeout or HTTP 408)
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Request { kind, .. } => *kind == RequestErrorKind::Timeout,
            Self::Http { status, .. } => *status == 408,
            _ => false,
        }
    }

    /// Check if this error is worth trying on another host
    ///
    /// Network errors, bad host URLs, 408 and any status that is neither 2xx
    /// nor 4xx qualify. Other 4xx answers would be the same on every host.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } | Self::BadHost { .. } => true,
            Self::Http { status, .. } => {
                *status == 408
                    || (!(200..300).contains(status) && !(400..500).contains(status))
            }
            Self::NoReachableHosts { .. }
            | Self::MissingData
            | Self::Decoding(_)
            | Self::MalformedRequest(_)
            | Self::EmptyResponses
            | Self::ResponseCountMismatch { .. } => false,
        }
    }

    /// Whether the retry loop should move on to the next host
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.is_timeout() || self.is_retryable()
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Http { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Http { status, .. } if *status >= 500)
    }

    /// HTTP status carried by this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Invalid(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was parsed
        path: String,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Create an invalid configuration error
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }
}
