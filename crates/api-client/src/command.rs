//! Transport-level description of one logical HTTP operation

use algolia_core::{CallType, RequestOptions, TransportError, TransportResult};
use serde::Serialize;
use std::fmt;

/// HTTP method of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical operation: method, path, call type, body and options
///
/// A command does not know which host it will be sent to; the transport
/// picks hosts and rewrites the target for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    call_type: CallType,
    method: HttpMethod,
    path: String,
    body: Option<Vec<u8>>,
    request_options: RequestOptions,
}

impl Command {
    /// Create a command with no body
    ///
    /// `path` must be absolute and already percent-encoded.
    pub fn new(call_type: CallType, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            call_type,
            method,
            path: path.into(),
            body: None,
            request_options: RequestOptions::default(),
        }
    }

    /// Create a read command
    pub fn read(method: HttpMethod, path: impl Into<String>) -> Self {
        Self::new(CallType::Read, method, path)
    }

    /// Create a write command
    pub fn write(method: HttpMethod, path: impl Into<String>) -> Self {
        Self::new(CallType::Write, method, path)
    }

    /// Builder-style method to attach a raw body
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Builder-style method to attach a JSON body
    pub fn with_json_body<B: Serialize + ?Sized>(self, body: &B) -> TransportResult<Self> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| TransportError::malformed(format!("cannot serialize body: {e}")))?;
        Ok(self.with_body(bytes))
    }

    /// Builder-style method to set request options
    #[must_use]
    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.request_options = options;
        self
    }

    /// Call type of the operation
    #[must_use]
    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Absolute, encoded path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Serialized body, if any
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Per-call options
    #[must_use]
    pub fn request_options(&self) -> &RequestOptions {
        &self.request_options
    }
}
