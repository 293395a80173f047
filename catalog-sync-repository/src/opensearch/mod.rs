//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend.

mod index_config;
mod provider;

pub use index_config::{
    get_index_settings, get_reconciled_settings, IndexConfig, INDEX_NAME, MAX_RESULT_WINDOW,
};
pub use provider::OpenSearchProvider;
