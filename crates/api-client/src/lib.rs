//! Algolia search client
//!
//! This crate provides a resilient HTTP client for the Algolia search API,
//! built on the host health tracking of `algolia-core`.
//!
//! # Features
//!
//! - **Multi-host failover**: Every request walks the healthy hosts for its
//!   call type until one answers
//! - **Host health tracking**: Failed hosts are skipped, slow hosts get a
//!   growing time budget, and both recover automatically
//! - **Disjunctive faceting**: One call returns hits plus facet counts that
//!   ignore each facet's own refinement
//! - **Async and blocking**: A tokio-based client, cancellable background
//!   requests, and a blocking wrapper
//! - **Request correlation**: Track requests with unique IDs for debugging
//!
//! # Example
//!
//! ```rust,no_run
//! use algolia_api_client::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SearchClient::with_config(ClientConfig::new("APPID", "api-key"))?;
//!
//!     let faceting = DisjunctiveFaceting::new(Refinements::new(), ["color"])
//!         .with_refinement("color", "red")
//!         .with_refinement("brand", "nike");
//!
//!     let response = client
//!         .search()
//!         .search_disjunctive_faceting("products", &Query::new("shoes"), &faceting)
//!         .await?;
//!
//!     println!("{} hits", response.nb_hits.unwrap_or_default());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod blocking;
pub mod client;
pub mod command;
pub mod endpoints;
pub mod error;
pub mod faceting;
pub mod logging;
pub mod models;
pub mod requester;
pub mod transport;

pub use blocking::{BlockingSearchClient, CancelHandle};
pub use client::{RequestTask, SearchClient};
pub use command::{Command, HttpMethod};
pub use error::{ClientError, ClientResult};
pub use faceting::{DisjunctiveFaceting, Refinements};
pub use requester::{HttpRequest, HttpRequester, HttpResponse, ReqwestRequester};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::blocking::{BlockingSearchClient, CancelHandle};
    pub use crate::client::{RequestTask, SearchClient};
    pub use crate::command::{Command, HttpMethod};
    pub use crate::endpoints::SearchApi;
    pub use crate::error::{ClientError, ClientResult};
    pub use crate::faceting::{DisjunctiveFaceting, Refinements};
    pub use crate::models::{IndexedQuery, Query, SearchResponse};
    pub use algolia_core::prelude::*;
}
