//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search engine operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch,
//! in-memory fakes for tests).

use async_trait::async_trait;
use catalog_sync_shared::ProductDocument;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;

/// Abstracts the underlying search engine.
///
/// This trait covers exactly the engine contracts the synchronization needs:
/// index lifecycle, upsert one or many documents, delete a document, run a
/// structured query, count documents and delete the whole index. Implementations
/// are injected into `ProductSearchRepository`, which owns query construction
/// and response parsing.
///
/// All writes are keyed by the document id (the catalog product id), so
/// replaying a write is harmless.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Check that the engine is reachable.
    async fn ping(&self) -> Result<(), SearchIndexError>;

    /// Ensure the index exists with the fixed schema, creating it if necessary.
    ///
    /// If the index already exists, mutable settings (result window size) are
    /// reconciled without touching data. An "already exists" conflict during
    /// creation is not an error.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If the index could not be created
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Create or fully replace one document (no partial-field merge).
    async fn index_document(&self, document: &ProductDocument) -> Result<(), SearchIndexError>;

    /// Create or fully replace many documents in one round trip.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-item outcomes; items may have failed individually
    /// * `Err(SearchIndexError)` - If the bulk request failed as a whole
    async fn bulk_index_documents(
        &self,
        documents: &[ProductDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Delete a document by product id.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_document(&self, product_id: i32) -> Result<(), SearchIndexError>;

    /// Run a structured search request and return the raw engine response.
    async fn search(&self, request: &Value) -> Result<Value, SearchIndexError>;

    /// Count documents in the index. A missing index counts as zero.
    async fn count_documents(&self) -> Result<u64, SearchIndexError>;

    /// Make recently written documents visible to search.
    async fn refresh(&self) -> Result<(), SearchIndexError>;

    /// Delete the whole index. A missing index is not an error.
    async fn delete_index(&self) -> Result<(), SearchIndexError>;
}
