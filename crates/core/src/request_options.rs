//! Per-call overrides layered on top of the client configuration

use crate::call_type::CallType;
use crate::config::ClientConfig;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-call request options
///
/// Every field is an override: when unset, the client configuration
/// applies. Merging happens field by field through the methods below.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Headers added to (or replacing) the client defaults
    pub headers: BTreeMap<String, String>,
    /// Query parameters appended to the URL
    pub query_parameters: BTreeMap<String, String>,
    /// Read timeout override
    pub read_timeout: Option<Duration>,
    /// Write timeout override
    pub write_timeout: Option<Duration>,
}

impl RequestOptions {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Builder-style method to add a query parameter
    #[must_use]
    pub fn with_query_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.query_parameters.insert(name.into(), value.into());
        self
    }

    /// Builder-style method to override the timeout of a call type
    #[must_use]
    pub fn with_timeout(mut self, call_type: CallType, timeout: Duration) -> Self {
        match call_type {
            CallType::Read => self.read_timeout = Some(timeout),
            CallType::Write => self.write_timeout = Some(timeout),
        }
        self
    }

    /// Timeout override for a call type, if any
    #[must_use]
    pub fn timeout(&self, call_type: CallType) -> Option<Duration> {
        match call_type {
            CallType::Read => self.read_timeout,
            CallType::Write => self.write_timeout,
        }
    }

    /// `override ?? configured` timeout for a call type
    #[must_use]
    pub fn effective_timeout(&self, call_type: CallType, config: &ClientConfig) -> Duration {
        self.timeout(call_type)
            .unwrap_or_else(|| config.timeout(call_type))
    }

    /// Default headers with these options' headers applied on top
    #[must_use]
    pub fn merged_headers(&self, defaults: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        overlay_headers(defaults, &self.headers)
    }
}

/// Apply `overrides` on top of `base`
///
/// Header names compare case-insensitively, so an override replaces a base
/// header spelled with different casing instead of sitting next to it.
#[must_use]
pub fn overlay_headers(
    base: &BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = base
        .iter()
        .filter(|(name, _)| !overrides.keys().any(|o| o.eq_ignore_ascii_case(name)))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    headers.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_falls_back_to_config() {
        let config = ClientConfig::new("APPID", "key");
        let options = RequestOptions::new().with_timeout(CallType::Write, Duration::from_secs(90));

        assert_eq!(
            options.effective_timeout(CallType::Read, &config),
            Duration::from_secs(5)
        );
        assert_eq!(
            options.effective_timeout(CallType::Write, &config),
            Duration::from_secs(90)
        );
    }

    #[test]
    fn test_headers_override_defaults() {
        let mut defaults = BTreeMap::new();
        defaults.insert("X-Algolia-API-Key".to_string(), "default".to_string());
        defaults.insert("User-Agent".to_string(), "client".to_string());

        let options = RequestOptions::new()
            .with_header("X-Algolia-API-Key", "secured")
            .with_header("X-Forwarded-For", "10.0.0.1");
        let merged = options.merged_headers(&defaults);

        assert_eq!(merged["X-Algolia-API-Key"], "secured");
        assert_eq!(merged["User-Agent"], "client");
        assert_eq!(merged["X-Forwarded-For"], "10.0.0.1");
    }

    #[test]
    fn test_header_override_ignores_case() {
        let mut defaults = BTreeMap::new();
        defaults.insert("X-Algolia-API-Key".to_string(), "default-key".to_string());
        defaults.insert("User-Agent".to_string(), "client".to_string());

        let options = RequestOptions::new().with_header("X-ALGOLIA-API-KEY", "secured-key");
        let merged = options.merged_headers(&defaults);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["X-ALGOLIA-API-KEY"], "secured-key");
        assert!(!merged.contains_key("X-Algolia-API-Key"));
        assert_eq!(merged["User-Agent"], "client");
    }

    #[test]
    fn test_query_parameters() {
        let options = RequestOptions::new().with_query_parameter("forwardToReplicas", "true");
        assert_eq!(options.query_parameters["forwardToReplicas"], "true");
        assert_eq!(options.timeout(CallType::Read), None);
    }
}
