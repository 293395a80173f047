//! # Catalog Sync Repository
//!
//! This crate owns everything on the search side of catalog synchronization:
//! the `SearchIndexProvider` abstraction over the search engine with its
//! OpenSearch implementation, the fixed product index schema, the in-memory
//! `CategoryPathResolver`, and `ProductSearchRepository`, which builds
//! structured queries and parses faceted responses.

pub mod categories;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod query;
pub mod response;
pub mod service;
pub mod types;
pub mod utils;

pub use categories::CategoryPathResolver;
pub use config::ProductSearchRepositoryConfig;
pub use errors::SearchIndexError;
pub use interfaces::{CategorySource, SearchIndexProvider};
pub use opensearch::OpenSearchProvider;
pub use service::ProductSearchRepository;
pub use types::{BatchOperationResult, BatchOperationSummary};
pub use utils::parse_document_id;
