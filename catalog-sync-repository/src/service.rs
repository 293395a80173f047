//! Product search repository.
//!
//! This module provides the main entry point for the search side of catalog
//! synchronization. The indexer and the outbox worker write through it, and
//! read paths use it to run faceted product searches.

use std::sync::Arc;

use catalog_sync_shared::{Product, ProductDocument, ProductSearchQuery, ProductSearchResult};
use tracing::{debug, instrument, warn};

use crate::categories::CategoryPathResolver;
use crate::config::ProductSearchRepositoryConfig;
use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::query::build_search_request;
use crate::response::parse_search_response;
use crate::utils::parse_document_id;

/// Failures listed individually in an aggregate bulk error before truncating.
const MAX_REPORTED_FAILURES: usize = 5;

/// Owns the index lifecycle and every read and write against the product index.
///
/// All writes are keyed by product id: `index_product` and `bulk_index` fully
/// replace any existing document, and `delete_product` succeeds for ids that
/// are not indexed. Replaying any write is therefore harmless.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use catalog_sync_repository::opensearch::{IndexConfig, OpenSearchProvider};
/// use catalog_sync_repository::{CategoryPathResolver, ProductSearchRepository};
/// use catalog_sync_shared::ProductSearchQuery;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// let categories = Arc::new(CategoryPathResolver::from_categories(vec![]));
/// let repository = ProductSearchRepository::new(Arc::new(provider), categories);
///
/// repository.ensure_index().await?;
/// let result = repository
///     .search(&ProductSearchQuery::text("kettle").with_categories(vec![7]))
///     .await?;
/// println!("{} matches", result.total);
/// # Ok(())
/// # }
/// ```
pub struct ProductSearchRepository {
    provider: Arc<dyn SearchIndexProvider>,
    categories: Arc<CategoryPathResolver>,
    config: ProductSearchRepositoryConfig,
}

impl ProductSearchRepository {
    /// Create a repository with the default configuration.
    ///
    /// # Arguments
    ///
    /// * `provider` - The search engine backend (e.g., `OpenSearchProvider`)
    /// * `categories` - Resolver used for denormalization and facet names
    pub fn new(
        provider: Arc<dyn SearchIndexProvider>,
        categories: Arc<CategoryPathResolver>,
    ) -> Self {
        Self::with_config(provider, categories, ProductSearchRepositoryConfig::default())
    }

    /// Create a repository with a custom configuration.
    pub fn with_config(
        provider: Arc<dyn SearchIndexProvider>,
        categories: Arc<CategoryPathResolver>,
        config: ProductSearchRepositoryConfig,
    ) -> Self {
        Self {
            provider,
            categories,
            config,
        }
    }

    /// The category resolver shared with this repository.
    pub fn categories(&self) -> &Arc<CategoryPathResolver> {
        &self.categories
    }

    /// Denormalize a catalog product using the loaded category tree.
    pub fn document_for(&self, product: &Product) -> ProductDocument {
        self.categories.document_for(product)
    }

    fn validate_batch_size(&self, size: usize) -> Result<(), SearchIndexError> {
        let max = self.config.max_batch_size;
        if size > max {
            return Err(SearchIndexError::batch_size_exceeded(size, max));
        }
        Ok(())
    }

    /// Check that the search engine is reachable.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        self.provider.ping().await
    }

    /// Create the index with the fixed schema if absent, otherwise reconcile its settings.
    pub async fn ensure_index(&self) -> Result<(), SearchIndexError> {
        self.provider.ensure_index_exists().await
    }

    /// Upsert one document.
    pub async fn index_product(&self, document: &ProductDocument) -> Result<(), SearchIndexError> {
        self.provider.index_document(document).await
    }

    /// Upsert many documents in one round trip.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If every document was written
    /// * `Err(SearchIndexError::BatchSizeExceeded)` - If the batch exceeds the configured maximum
    /// * `Err(SearchIndexError::BulkIndexError)` - If any item failed; the message lists the failures
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub async fn bulk_index(&self, documents: &[ProductDocument]) -> Result<(), SearchIndexError> {
        if documents.is_empty() {
            return Ok(());
        }

        self.validate_batch_size(documents.len())?;

        let summary = self.provider.bulk_index_documents(documents).await?;
        if summary.is_complete_success() {
            debug!(succeeded = summary.succeeded, "Bulk index completed");
            return Ok(());
        }

        let reported: Vec<String> = summary
            .failures()
            .take(MAX_REPORTED_FAILURES)
            .map(|failure| match &failure.error {
                Some(error) => format!("{}: {}", failure.document_id, error),
                None => failure.document_id.clone(),
            })
            .collect();
        let omitted = summary.failed.saturating_sub(reported.len());

        let failed_ids: Vec<i32> = summary
            .failures()
            .filter_map(|failure| parse_document_id(&failure.document_id).ok())
            .collect();
        warn!(
            failed = summary.failed,
            total = summary.total,
            failed_ids = ?failed_ids,
            "Bulk index had item failures"
        );

        let mut message = format!(
            "{} of {} documents failed: {}",
            summary.failed,
            summary.total,
            reported.join("; ")
        );
        if omitted > 0 {
            message.push_str(&format!(" (and {} more)", omitted));
        }
        Err(SearchIndexError::bulk_index(message))
    }

    /// Delete a product's document. Deleting a missing document succeeds.
    pub async fn delete_product(&self, product_id: i32) -> Result<(), SearchIndexError> {
        self.provider.delete_document(product_id).await
    }

    /// Run a faceted product search.
    #[instrument(skip_all, fields(text = %query.text, categories = query.category_ids.len()))]
    pub async fn search(
        &self,
        query: &ProductSearchQuery,
    ) -> Result<ProductSearchResult, SearchIndexError> {
        let request = build_search_request(query);
        let response = self.provider.search(&request).await?;
        let result = parse_search_response(response, &self.categories)?;
        debug!(total = result.total, returned = result.len(), "Search completed");
        Ok(result)
    }

    /// Number of indexed documents. A missing index counts as zero.
    pub async fn document_count(&self) -> Result<u64, SearchIndexError> {
        self.provider.count_documents().await
    }

    /// Make recent writes visible to search.
    pub async fn refresh(&self) -> Result<(), SearchIndexError> {
        self.provider.refresh().await
    }

    /// Drop the whole index.
    pub async fn delete_index(&self) -> Result<(), SearchIndexError> {
        self.provider.delete_index().await
    }
}
