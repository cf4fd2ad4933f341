//! HTTP requester seam
//!
//! The transport talks to the network through [`HttpRequester`]. The
//! production implementation wraps `reqwest`; tests plug in scripted
//! requesters. Network failures are classified here, at the boundary, into
//! [`TransportError::Request`] so the retry strategy never has to inspect
//! client-specific error types.

use algolia_core::{RequestErrorKind, TransportError, TransportResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use crate::command::HttpMethod;

/// A fully resolved request for one attempt against one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL including query parameters
    pub url: Url,
    /// Headers to send
    pub headers: BTreeMap<String, String>,
    /// Body bytes
    pub body: Option<Vec<u8>>,
    /// Time budget for this attempt
    pub timeout: Duration,
}

/// Raw response of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Body bytes
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single attempt over the network
///
/// Implementations return `Ok` for any HTTP answer, whatever its status,
/// and `Err` only when no answer was obtained.
pub trait HttpRequester: Send + Sync + 'static {
    /// Perform one request
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = TransportResult<HttpResponse>> + Send;
}

/// `reqwest`-backed requester
#[derive(Debug, Clone)]
pub struct ReqwestRequester {
    inner: Client,
}

impl ReqwestRequester {
    /// Create a requester with a fresh connection pool
    pub fn new() -> Result<Self, reqwest::Error> {
        let inner = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self { inner })
    }

    /// Wrap an existing `reqwest` client
    #[must_use]
    pub fn from_client(inner: Client) -> Self {
        Self { inner }
    }
}

impl HttpRequester for ReqwestRequester {
    async fn send(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut builder = self
            .inner
            .request(method, request.url)
            .headers(header_map(&request.headers)?)
            .timeout(request.timeout);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> TransportResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            TransportError::malformed(format!("invalid header name {name}: {e}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::malformed(format!("invalid value for header {name}: {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Map a `reqwest` failure onto the transport taxonomy
fn classify(error: reqwest::Error) -> TransportError {
    let kind = if error.is_timeout() {
        RequestErrorKind::Timeout
    } else if error.is_connect() {
        RequestErrorKind::Connect
    } else if error.is_builder() {
        return TransportError::malformed(error.to_string());
    } else {
        RequestErrorKind::Network
    };
    TransportError::request(kind, error.to_string())
}
