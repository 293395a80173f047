//! Full catalog-to-index rebuild.

use std::sync::Arc;

use catalog_sync_repository::ProductSearchRepository;
use catalog_sync_shared::ProductDocument;
use tracing::{debug, info, instrument};

use crate::catalog::CatalogStore;
use crate::errors::SyncError;

/// Configuration for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Number of documents per bulk request.
    pub batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

/// Rebuilds the product index from the catalog.
///
/// Every product is denormalized with the loaded category tree and written in
/// fixed-size batches. A failed batch aborts the rebuild; documents already
/// written stay in place.
pub struct Indexer {
    catalog: Arc<dyn CatalogStore>,
    repository: Arc<ProductSearchRepository>,
    config: IndexerConfig,
}

impl Indexer {
    /// Create a new indexer with the default batch size.
    pub fn new(catalog: Arc<dyn CatalogStore>, repository: Arc<ProductSearchRepository>) -> Self {
        Self::with_config(catalog, repository, IndexerConfig::default())
    }

    /// Create a new indexer with custom configuration.
    pub fn with_config(
        catalog: Arc<dyn CatalogStore>,
        repository: Arc<ProductSearchRepository>,
        config: IndexerConfig,
    ) -> Self {
        Self {
            catalog,
            repository,
            config,
        }
    }

    /// Reindex only when the index holds no documents.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If a reindex ran
    /// * `Ok(false)` - If the index was already populated and nothing was written
    pub async fn ensure_indexed(&self) -> Result<bool, SyncError> {
        let count = self.repository.document_count().await?;
        if count > 0 {
            info!(documents = count, "Search index already populated");
            return Ok(false);
        }

        info!("Search index is empty, starting initial indexing");
        self.reindex().await?;
        Ok(true)
    }

    /// Write every catalog product to the index, then refresh it.
    ///
    /// Returns the number of documents written.
    #[instrument(skip(self), fields(batch_size = self.config.batch_size))]
    pub async fn reindex(&self) -> Result<usize, SyncError> {
        let products = self.catalog.fetch_all_products().await?;
        info!(count = products.len(), "Loaded products from catalog");

        let documents: Vec<ProductDocument> = products
            .iter()
            .map(|product| self.repository.document_for(product))
            .collect();

        let batch_size = self.config.batch_size.max(1);
        for (batch_number, batch) in documents.chunks(batch_size).enumerate() {
            self.repository.bulk_index(batch).await?;

            let from = batch_number * batch_size;
            debug!(from, to = from + batch.len(), "Indexed batch");
        }

        self.repository.refresh().await?;

        info!(total = documents.len(), "Indexing complete");
        Ok(documents.len())
    }
}
