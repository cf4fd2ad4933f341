//! Retry-aware host selection for the Algolia search client
//!
//! This crate holds the network-free half of the transport:
//!
//! - **Host registry**: per-host health (up/down, retry count, last update)
//! - **Retry strategy**: ordered host iteration per call type, outcome
//!   bookkeeping, expiry and self-healing when every host is down
//! - **Error taxonomy**: classified transport errors deciding retry vs. fail
//! - **Configuration**: client configuration and per-call request options
//!
//! # Example
//!
//! ```rust
//! use algolia_core::{CallType, ClientConfig, RequestOptions};
//!
//! let config = ClientConfig::new("APPID", "api-key");
//! let strategy = config.retry_strategy();
//!
//! let host = strategy.retryable_hosts(CallType::Read).next().unwrap();
//! let timeout = RequestOptions::new().effective_timeout(CallType::Read, &config);
//! assert_eq!(host.timeout(timeout), config.read_timeout);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod call_type;
pub mod config;
pub mod error;
pub mod host;
pub mod request_options;
pub mod retry_strategy;

pub use call_type::{CallType, CallTypes};
pub use config::{default_hosts, ClientConfig, HostConfig};
pub use error::{ConfigError, ConfigResult, RequestErrorKind, TransportError, TransportResult};
pub use host::RetryableHost;
pub use request_options::RequestOptions;
pub use retry_strategy::{HostIterator, Outcome, RetryStrategy, DEFAULT_EXPIRATION_DELAY};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::call_type::{CallType, CallTypes};
    pub use crate::config::{ClientConfig, HostConfig};
    pub use crate::error::{TransportError, TransportResult};
    pub use crate::request_options::RequestOptions;
    pub use crate::retry_strategy::{HostIterator, RetryStrategy};
}
