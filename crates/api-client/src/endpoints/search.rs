//! Search endpoints

use crate::client::SearchClient;
use crate::command::{Command, HttpMethod};
use crate::faceting::DisjunctiveFaceting;
use crate::models::{
    IndexedQuery, MultipleQueriesRequest, MultipleQueriesResponse, MultipleQueriesStrategy, Query,
    SearchResponse,
};
use crate::requester::{HttpRequester, ReqwestRequester};
use algolia_core::{RequestOptions, TransportResult};
use tracing::{instrument, warn};

/// Search API interface
pub struct SearchApi<R = ReqwestRequester> {
    client: SearchClient<R>,
}

impl<R> Clone for SearchApi<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<R: HttpRequester> SearchApi<R> {
    /// Create a new search API interface
    pub(crate) fn new(client: SearchClient<R>) -> Self {
        Self { client }
    }

    /// Search one index
    ///
    /// POST /1/indexes/{index}/query
    pub async fn search(&self, index_name: &str, query: &Query) -> TransportResult<SearchResponse> {
        self.search_with_options(index_name, query, RequestOptions::default())
            .await
    }

    /// Search one index with per-call options
    pub async fn search_with_options(
        &self,
        index_name: &str,
        query: &Query,
        options: RequestOptions,
    ) -> TransportResult<SearchResponse> {
        let command = search_command(index_name, query)?.with_request_options(options);
        self.client.execute(&command).await
    }

    /// Run several queries in one round trip
    ///
    /// POST /1/indexes/*/queries
    pub async fn multiple_queries(
        &self,
        queries: Vec<IndexedQuery>,
        strategy: Option<MultipleQueriesStrategy>,
        options: RequestOptions,
    ) -> TransportResult<MultipleQueriesResponse> {
        let command = multiple_queries_command(queries, strategy)?.with_request_options(options);
        self.client.execute(&command).await
    }

    /// Search with disjunctive facets
    ///
    /// Sends the global query and one facet-only query per disjunctive
    /// facet as a single multi-index request, then merges the results.
    pub async fn search_disjunctive_faceting(
        &self,
        index_name: &str,
        query: &Query,
        faceting: &DisjunctiveFaceting,
    ) -> TransportResult<SearchResponse> {
        self.search_disjunctive_faceting_with_options(
            index_name,
            query,
            faceting,
            RequestOptions::default(),
        )
        .await
    }

    /// Search with disjunctive facets and per-call options
    ///
    /// The options apply to the single multi-index request. A result list
    /// that does not hold one entry per query is an error.
    #[instrument(
        skip(self, query, faceting, options),
        fields(facets = faceting.disjunctive_facets().len())
    )]
    pub async fn search_disjunctive_faceting_with_options(
        &self,
        index_name: &str,
        query: &Query,
        faceting: &DisjunctiveFaceting,
        options: RequestOptions,
    ) -> TransportResult<SearchResponse> {
        let queries: Vec<_> = faceting
            .make_queries(query)
            .into_iter()
            .map(|q| IndexedQuery::new(index_name, q))
            .collect();

        let response = self.multiple_queries(queries, None, options).await?;

        faceting.merge_responses(response.results).inspect_err(|e| {
            warn!(error = %e, "Could not merge faceting results");
        })
    }
}

/// Build the command for a single-index search
pub fn search_command(index_name: &str, query: &Query) -> TransportResult<Command> {
    let path = format!("/1/indexes/{}/query", urlencoding::encode(index_name));
    Command::read(HttpMethod::Post, path).with_json_body(query)
}

/// Build the command for a multi-index search
pub fn multiple_queries_command(
    queries: Vec<IndexedQuery>,
    strategy: Option<MultipleQueriesStrategy>,
) -> TransportResult<Command> {
    let body = MultipleQueriesRequest {
        requests: queries,
        strategy,
    };
    Command::read(HttpMethod::Post, "/1/indexes/*/queries").with_json_body(&body)
}
