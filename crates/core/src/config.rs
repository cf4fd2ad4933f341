//! Client configuration
//!
//! Supports environment-based configuration, TOML files and builder-style
//! overrides on top of sensible defaults.

use crate::call_type::{CallType, CallTypes};
use crate::error::{ConfigError, ConfigResult};
use crate::host::RetryableHost;
use crate::retry_strategy::{RetryStrategy, DEFAULT_EXPIRATION_DELAY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Default timeout for read operations
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for write operations
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// One configured endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host name (optionally with scheme and port)
    pub url: String,
    /// Call types the host accepts
    #[serde(default = "universal")]
    pub call_types: CallTypes,
}

fn universal() -> CallTypes {
    CallTypes::Universal
}

impl HostConfig {
    /// Create a host entry
    pub fn new(url: impl Into<String>, call_types: CallTypes) -> Self {
        Self {
            url: url.into(),
            call_types,
        }
    }
}

impl From<&HostConfig> for RetryableHost {
    fn from(host: &HostConfig) -> Self {
        RetryableHost::new(host.url.clone(), host.call_types)
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Application ID
    pub app_id: String,
    /// API key sent with every request
    pub api_key: String,
    /// Timeout for read operations
    #[serde(with = "duration_secs")]
    pub read_timeout: Duration,
    /// Timeout for write operations
    #[serde(with = "duration_secs")]
    pub write_timeout: Duration,
    /// Hosts in priority order; derived from `app_id` when empty
    pub hosts: Vec<HostConfig>,
    /// Extra headers sent with every request
    pub default_headers: BTreeMap<String, String>,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Delay after which a host marked down is retried
    #[serde(with = "duration_secs")]
    pub host_expiration: Duration,
}

mod duration_secs {
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            hosts: Vec::new(),
            default_headers: BTreeMap::new(),
            log_level: "info".to_string(),
            host_expiration: DEFAULT_EXPIRATION_DELAY,
        }
    }
}

impl ClientConfig {
    /// Create a configuration for an application with its default hosts
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let app_id = app_id.into();
        Self {
            hosts: default_hosts(&app_id),
            app_id,
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `ALGOLIA_APP_ID`: Application ID (required)
    /// - `ALGOLIA_API_KEY`: API key (required)
    /// - `ALGOLIA_READ_TIMEOUT_SECS`: Read timeout in seconds
    /// - `ALGOLIA_WRITE_TIMEOUT_SECS`: Write timeout in seconds
    /// - `ALGOLIA_LOG_LEVEL`: Log level (trace/debug/info/warn/error)
    pub fn from_env() -> ConfigResult<Self> {
        let app_id =
            env::var("ALGOLIA_APP_ID").map_err(|_| ConfigError::missing_env("ALGOLIA_APP_ID"))?;
        let api_key =
            env::var("ALGOLIA_API_KEY").map_err(|_| ConfigError::missing_env("ALGOLIA_API_KEY"))?;

        let mut config = Self::new(app_id, api_key);

        if let Some(timeout) = secs_from_env("ALGOLIA_READ_TIMEOUT_SECS") {
            config.read_timeout = timeout;
        }
        if let Some(timeout) = secs_from_env("ALGOLIA_WRITE_TIMEOUT_SECS") {
            config.write_timeout = timeout;
        }
        if let Ok(level) = env::var("ALGOLIA_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// Missing fields take their default values; an empty host list is
    /// filled in from the application ID.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let mut config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;

        if config.hosts.is_empty() {
            config.hosts = default_hosts(&config.app_id);
        }
        Ok(config)
    }

    /// Builder-style method to replace the host list
    #[must_use]
    pub fn with_hosts(mut self, hosts: Vec<HostConfig>) -> Self {
        self.hosts = hosts;
        self
    }

    /// Builder-style method to set the read timeout
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Builder-style method to set the write timeout
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Builder-style method to add a default header
    #[must_use]
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style method to set the log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Builder-style method to set the host expiration delay
    #[must_use]
    pub fn with_host_expiration(mut self, delay: Duration) -> Self {
        self.host_expiration = delay;
        self
    }

    /// Configured timeout for a call type
    #[must_use]
    pub fn timeout(&self, call_type: CallType) -> Duration {
        match call_type {
            CallType::Read => self.read_timeout,
            CallType::Write => self.write_timeout,
        }
    }

    /// Build the retry strategy for the configured hosts
    #[must_use]
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.hosts.iter().map(RetryableHost::from).collect())
            .with_expiration_delay(self.host_expiration)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.app_id.is_empty() {
            return Err(ConfigError::invalid("app_id cannot be empty"));
        }

        if self.api_key.is_empty() {
            return Err(ConfigError::invalid("api_key cannot be empty"));
        }

        if self.read_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(ConfigError::invalid("timeouts cannot be zero"));
        }

        if self.hosts.iter().any(|h| h.url.trim().is_empty()) {
            return Err(ConfigError::invalid("host url cannot be empty"));
        }

        for call_type in [CallType::Read, CallType::Write] {
            if !self.hosts.iter().any(|h| h.call_types.contains(call_type)) {
                return Err(ConfigError::invalid(format!(
                    "no host configured for {call_type} operations"
                )));
            }
        }

        Ok(())
    }
}

fn secs_from_env(var: &str) -> Option<Duration> {
    env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Default hosts for an application
///
/// The dedicated read and write clusters come first, followed by the three
/// fallback hosts in random order so clients spread their retries.
#[must_use]
pub fn default_hosts(app_id: &str) -> Vec<HostConfig> {
    let mut fallbacks: Vec<HostConfig> = (1..=3)
        .map(|i| HostConfig::new(format!("{app_id}-{i}.algolianet.com"), CallTypes::Universal))
        .collect();
    shuffle(&mut fallbacks);

    let mut hosts = vec![
        HostConfig::new(format!("{app_id}-dsn.algolia.net"), CallTypes::Read),
        HostConfig::new(format!("{app_id}.algolia.net"), CallTypes::Write),
    ];
    hosts.extend(fallbacks);
    hosts
}

/// Fisher-Yates shuffle seeded from the std hasher's random keys
fn shuffle<T>(items: &mut [T]) {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let state = RandomState::new();
    for i in (1..items.len()).rev() {
        let j = (state.hash_one(i) % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}
