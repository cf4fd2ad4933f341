//! Request dispatch with host rotation
//!
//! [`Transport::execute`] runs the retry loop for one logical request:
//!
//! 1. Pull the next host from the [`HostIterator`](algolia_core::HostIterator);
//!    when none is left, fail with `NoReachableHosts` carrying every error
//!    seen so far.
//! 2. Compute the attempt timeout (`options ?? config`, scaled by the host's
//!    retry count) and send the request to that host.
//! 3. Report the outcome to the [`RetryStrategy`].
//! 4. Decode a success, move on to the next host after a retryable failure,
//!    or return any other failure as is.

use crate::command::Command;
use crate::requester::{HttpRequest, HttpRequester, HttpResponse};
use algolia_core::request_options::overlay_headers;
use algolia_core::{
    ClientConfig, RetryStrategy, RetryableHost, TransportError, TransportResult,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Application ID header
pub const APPLICATION_ID_HEADER: &str = "X-Algolia-Application-Id";

/// API key header
pub const API_KEY_HEADER: &str = "X-Algolia-API-Key";

/// Retry-aware dispatcher shared by every API of a client
#[derive(Debug)]
pub struct Transport<R> {
    requester: R,
    config: ClientConfig,
    retry_strategy: RetryStrategy,
    default_headers: BTreeMap<String, String>,
}

impl<R: HttpRequester> Transport<R> {
    /// Create a transport for the given configuration
    pub fn new(config: ClientConfig, requester: R) -> Self {
        let retry_strategy = config.retry_strategy();
        let default_headers = default_headers(&config);
        Self {
            requester,
            config,
            retry_strategy,
            default_headers,
        }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared retry strategy
    #[must_use]
    pub fn retry_strategy(&self) -> &RetryStrategy {
        &self.retry_strategy
    }

    /// Execute a command and decode its response
    #[instrument(
        skip(self, command),
        fields(
            method = %command.method(),
            path = %command.path(),
            request_id = tracing::field::Empty
        )
    )]
    pub async fn execute<T: DeserializeOwned>(&self, command: &Command) -> TransportResult<T> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        let call_type = command.call_type();
        let base_timeout = command
            .request_options()
            .effective_timeout(call_type, &self.config);

        let mut hosts = self.retry_strategy.retryable_hosts(call_type);
        let mut intermediate_errors = Vec::new();

        loop {
            let Some(host) = hosts.next() else {
                warn!(
                    attempts = intermediate_errors.len(),
                    "No reachable hosts left"
                );
                return Err(TransportError::NoReachableHosts {
                    intermediate_errors,
                });
            };

            let timeout = host.timeout(base_timeout);
            let result = self.attempt(&host, command, &request_id, timeout).await;
            self.retry_strategy.notify(host.url(), &result);

            match result {
                Ok(response) => return decode(&response),
                Err(e) if e.can_retry() => {
                    debug!(
                        host = %host.url(),
                        error = %e,
                        timeout = e.is_timeout(),
                        "Attempt failed, trying next host"
                    );
                    intermediate_errors.push(e);
                }
                Err(e) => {
                    debug!(host = %host.url(), error = %e, "Attempt failed, not retrying");
                    return Err(e);
                }
            }
        }
    }

    /// Send the command to one host; non-2xx answers become errors
    async fn attempt(
        &self,
        host: &RetryableHost,
        command: &Command,
        request_id: &str,
        timeout: Duration,
    ) -> TransportResult<HttpResponse> {
        let url = build_url(host.url(), command)?;

        let mut headers = command
            .request_options()
            .merged_headers(&self.default_headers);
        headers.insert(X_REQUEST_ID.to_string(), request_id.to_string());

        debug!(
            method = %command.method(),
            url = %url,
            headers = ?redacted(&headers),
            body = %command.body().map(String::from_utf8_lossy).unwrap_or_default(),
            timeout_ms = timeout.as_millis(),
            "Sending request"
        );

        let response = self
            .requester
            .send(HttpRequest {
                method: command.method(),
                url,
                headers,
                body: command.body().map(<[u8]>::to_vec),
                timeout,
            })
            .await?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(TransportError::http(response.status, error_message(&response.body)))
        }
    }
}

fn default_headers(config: &ClientConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(APPLICATION_ID_HEADER.to_string(), config.app_id.clone());
    headers.insert(API_KEY_HEADER.to_string(), config.api_key.clone());
    headers.insert(
        "Content-Type".to_string(),
        "application/json; charset=utf-8".to_string(),
    );
    headers.insert(
        "User-Agent".to_string(),
        format!("Algolia for Rust ({})", env!("CARGO_PKG_VERSION")),
    );
    overlay_headers(&headers, &config.default_headers)
}

/// Resolve `host + path + query` into a URL
///
/// Hosts without a scheme are reached over HTTPS.
fn build_url(host: &str, command: &Command) -> TransportResult<Url> {
    let base = if host.contains("://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{host}")
    };

    let mut url = Url::parse(&format!("{base}{}", command.path()))
        .map_err(|e| TransportError::bad_host(host, e.to_string()))?;

    let query = &command.request_options().query_parameters;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}

fn redacted(headers: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case(API_KEY_HEADER) {
                (name.as_str(), "<redacted>")
            } else {
                (name.as_str(), value.as_str())
            }
        })
        .collect()
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Message of an error payload: the `message` field, else the raw text
fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(ErrorBody { message }) = serde_json::from_slice(body) {
        return Some(message);
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> TransportResult<T> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Err(TransportError::MissingData);
    }
    Ok(serde_json::from_slice(&response.body)?)
}
