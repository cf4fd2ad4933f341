//! Search request and response models
//!
//! Only the fields the transport and the faceting aggregator reason about
//! are typed. Everything else round-trips through the flattened `extra`
//! maps untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Facet value counts for one attribute
pub type FacetCounts = BTreeMap<String, u64>;

/// Search parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Full-text query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Filter expression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<String>,
    /// Attributes to compute facet counts for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<String>>,
    /// Page number, zero-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Hits per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits_per_page: Option<u32>,
    /// Attributes returned in hits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_retrieve: Option<Vec<String>>,
    /// Attributes to highlight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_highlight: Option<Vec<String>>,
    /// Attributes to snippet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_snippet: Option<Vec<String>>,
    /// Whether the query counts in analytics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<bool>,
    /// Any other search parameter
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Query {
    /// Create a query for the given text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            query: Some(text.into()),
            ..Self::default()
        }
    }

    /// Builder-style method to set filters
    #[must_use]
    pub fn with_filters(mut self, filters: impl Into<String>) -> Self {
        self.filters = Some(filters.into());
        self
    }

    /// Builder-style method to set facets
    #[must_use]
    pub fn with_facets<I, S>(mut self, facets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = Some(facets.into_iter().map(Into::into).collect());
        self
    }

    /// Builder-style method to set hits per page
    #[must_use]
    pub fn with_hits_per_page(mut self, hits_per_page: u32) -> Self {
        self.hits_per_page = Some(hits_per_page);
        self
    }

    /// Builder-style method to set the page
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Builder-style method to set an arbitrary parameter
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Numeric statistics of a facet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacetStats {
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Average value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    /// Sum of values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<f64>,
}

/// Result of one search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Matching records
    #[serde(default)]
    pub hits: Vec<Value>,
    /// Number of matching records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_hits: Option<u64>,
    /// Current page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Number of pages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nb_pages: Option<u32>,
    /// Hits per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits_per_page: Option<u32>,
    /// Server processing time
    #[serde(rename = "processingTimeMS", skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    /// Query text echoed back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Index the response comes from (multi-index queries)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Facet counts per attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<BTreeMap<String, FacetCounts>>,
    /// Facet counts of the disjunctive facets, set by the faceting merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disjunctive_facets: Option<BTreeMap<String, FacetCounts>>,
    /// Numeric facet statistics
    #[serde(rename = "facets_stats", skip_serializing_if = "Option::is_none")]
    pub facets_stats: Option<BTreeMap<String, FacetStats>>,
    /// Whether facet counts are exact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaustive_facets_count: Option<bool>,
    /// Any other response field
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query addressed to a specific index, for multi-index requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedQuery {
    /// Target index
    pub index_name: String,
    /// Search parameters
    #[serde(flatten)]
    pub query: Query,
}

impl IndexedQuery {
    /// Create an indexed query
    pub fn new(index_name: impl Into<String>, query: Query) -> Self {
        Self {
            index_name: index_name.into(),
            query,
        }
    }
}

/// How the engine runs the queries of a multi-index request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultipleQueriesStrategy {
    /// Run every query
    None,
    /// Stop once a query returns enough hits
    StopIfEnoughMatches,
}

/// Body of a multi-index request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleQueriesRequest {
    /// Queries, in order
    pub requests: Vec<IndexedQuery>,
    /// Execution strategy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<MultipleQueriesStrategy>,
}

/// Result of a multi-index request; results follow the request order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultipleQueriesResponse {
    /// One response per query
    pub results: Vec<SearchResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_serialization_skips_unset() {
        let query = Query::new("shoes")
            .with_hits_per_page(20)
            .with_parameter("typoTolerance", false);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            json!({"query": "shoes", "hitsPerPage": 20, "typoTolerance": false})
        );
    }

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{
            "hits": [{"objectID": "1"}],
            "nbHits": 1,
            "page": 0,
            "nbPages": 1,
            "hitsPerPage": 20,
            "processingTimeMS": 2,
            "facets": {"color": {"red": 5}},
            "facets_stats": {"price": {"min": 1.0, "max": 9.5, "avg": 4.2, "sum": 42.0}},
            "exhaustiveFacetsCount": true,
            "params": "query="
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.nb_hits, Some(1));
        assert_eq!(response.processing_time_ms, Some(2));
        assert_eq!(response.facets.unwrap()["color"]["red"], 5);
        assert_eq!(response.facets_stats.unwrap()["price"].max, 9.5);
        assert_eq!(response.exhaustive_facets_count, Some(true));
        assert_eq!(response.extra["params"], "query=");
    }

    #[test]
    fn test_indexed_query_is_flat() {
        let request = MultipleQueriesRequest {
            requests: vec![IndexedQuery::new("products", Query::new("a").with_facets(["brand"]))],
            strategy: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            json!({"requests": [{"indexName": "products", "query": "a", "facets": ["brand"]}]})
        );
    }
}
