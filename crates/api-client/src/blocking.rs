//! Blocking wrapper for callers outside an async context
//!
//! Each call blocks the current thread until the underlying asynchronous
//! operation completes. Do not use from inside a tokio runtime.
//!
//! A blocked call can be abandoned from another thread through a
//! [`CancelHandle`] passed to [`BlockingSearchClient::execute_cancellable`].

use crate::client::SearchClient;
use crate::command::Command;
use crate::error::{ClientError, ClientResult};
use crate::faceting::DisjunctiveFaceting;
use crate::models::{
    IndexedQuery, MultipleQueriesResponse, MultipleQueriesStrategy, Query, SearchResponse,
};
use crate::requester::{HttpRequester, ReqwestRequester};
use algolia_core::{ClientConfig, RequestOptions, TransportResult};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::watch;
use tracing::debug;

/// Cancels blocking calls from another thread
///
/// Clones share state. Once cancelled, a handle stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    state: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    /// Create a handle that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Abandon every call waiting on this handle
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) was called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    async fn cancelled(&self) {
        let mut state = self.state.subscribe();
        loop {
            if *state.borrow_and_update() {
                return;
            }
            if state.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

/// Blocking Algolia search client
pub struct BlockingSearchClient<R = ReqwestRequester> {
    client: SearchClient<R>,
    runtime: Runtime,
}

impl BlockingSearchClient<ReqwestRequester> {
    /// Create a client with configuration from the environment
    pub fn new() -> ClientResult<Self> {
        Self::with_config(ClientConfig::from_env()?)
    }

    /// Create a client with a specific configuration
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            client: SearchClient::with_config(config)?,
            runtime: runtime()?,
        })
    }
}

impl<R: HttpRequester> BlockingSearchClient<R> {
    /// Wrap an async client
    pub fn from_client(client: SearchClient<R>) -> ClientResult<Self> {
        Ok(Self {
            client,
            runtime: runtime()?,
        })
    }

    /// Underlying async client
    #[must_use]
    pub fn client(&self) -> &SearchClient<R> {
        &self.client
    }

    /// Execute an arbitrary command
    pub fn execute<T: DeserializeOwned>(&self, command: &Command) -> TransportResult<T> {
        self.runtime.block_on(self.client.execute(command))
    }

    /// Execute a command unless `cancel` fires first
    ///
    /// Returns `None` when the call was cancelled; the in-flight request is
    /// dropped. A handle cancelled beforehand prevents the call entirely.
    pub fn execute_cancellable<T: DeserializeOwned>(
        &self,
        command: &Command,
        cancel: &CancelHandle,
    ) -> Option<TransportResult<T>> {
        self.runtime.block_on(async {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(path = %command.path(), "Blocking call cancelled");
                    None
                }
                result = self.client.execute(command) => Some(result),
            }
        })
    }

    /// Search one index
    pub fn search(&self, index_name: &str, query: &Query) -> TransportResult<SearchResponse> {
        self.runtime
            .block_on(self.client.search().search(index_name, query))
    }

    /// Run several queries in one round trip
    pub fn multiple_queries(
        &self,
        queries: Vec<IndexedQuery>,
        strategy: Option<MultipleQueriesStrategy>,
    ) -> TransportResult<MultipleQueriesResponse> {
        self.runtime.block_on(
            self.client
                .search()
                .multiple_queries(queries, strategy, RequestOptions::default()),
        )
    }

    /// Search with disjunctive facets
    pub fn search_disjunctive_faceting(
        &self,
        index_name: &str,
        query: &Query,
        faceting: &DisjunctiveFaceting,
        options: RequestOptions,
    ) -> TransportResult<SearchResponse> {
        self.runtime.block_on(
            self.client
                .search()
                .search_disjunctive_faceting_with_options(index_name, query, faceting, options),
        )
    }
}

fn runtime() -> ClientResult<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ClientError::Runtime)
}
