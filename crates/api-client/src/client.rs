//! Main API client implementation

use crate::command::Command;
use crate::endpoints::SearchApi;
use crate::error::ClientResult;
use crate::requester::{HttpRequester, ReqwestRequester};
use crate::transport::Transport;
use algolia_core::{ClientConfig, RetryStrategy, TransportResult};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Algolia search client
///
/// Cheap to clone: clones share the transport, and therefore the host
/// health state, with the original.
pub struct SearchClient<R = ReqwestRequester> {
    transport: Arc<Transport<R>>,
}

impl<R> Clone for SearchClient<R> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl SearchClient<ReqwestRequester> {
    /// Create a client with configuration from the environment
    pub fn new() -> ClientResult<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a client with a specific configuration
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        Self::with_requester(config, ReqwestRequester::new()?)
    }
}

impl<R: HttpRequester> SearchClient<R> {
    /// Create a client sending requests through `requester`
    pub fn with_requester(config: ClientConfig, requester: R) -> ClientResult<Self> {
        config.validate()?;
        Ok(Self {
            transport: Arc::new(Transport::new(config, requester)),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    /// Host health state shared by every request of this client
    #[must_use]
    pub fn retry_strategy(&self) -> &RetryStrategy {
        self.transport.retry_strategy()
    }

    /// Access search endpoints
    #[must_use]
    pub fn search(&self) -> SearchApi<R> {
        SearchApi::new(self.clone())
    }

    /// Execute an arbitrary command
    pub async fn execute<T: DeserializeOwned>(&self, command: &Command) -> TransportResult<T> {
        self.transport.execute(command).await
    }

    /// Execute a command on a background task that can be cancelled
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<T>(&self, command: Command) -> RequestTask<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        RequestTask {
            handle: tokio::spawn(async move { transport.execute(&command).await }),
        }
    }
}

/// Handle to a request running in the background
#[derive(Debug)]
pub struct RequestTask<T> {
    handle: JoinHandle<TransportResult<T>>,
}

impl<T> RequestTask<T> {
    /// Abort the request, including any in-flight attempt and pending retry
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the request has completed (or was cancelled)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the outcome; `None` if the request was cancelled
    pub async fn wait(self) -> Option<TransportResult<T>> {
        match self.handle.await {
            Ok(result) => Some(result),
            Err(e) if e.is_cancelled() => None,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}
