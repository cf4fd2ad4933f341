//! Endpoint-specific API implementations
//!
//! - `search`: single and multi-index search (`/1/indexes/{index}/query`,
//!   `/1/indexes/*/queries`) and disjunctive faceting

pub mod search;

pub use search::SearchApi;
