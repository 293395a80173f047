//! Startup wiring: category load, index ensure, cold-start reindex, worker start.

use std::sync::Arc;

use catalog_sync_repository::{
    CategoryPathResolver, CategorySource, ProductSearchRepository, ProductSearchRepositoryConfig,
    SearchIndexProvider,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::catalog::{CatalogStore, ChangeLog};
use crate::errors::SetupError;
use crate::indexer::{Indexer, IndexerConfig};
use crate::worker::{OutboxWorker, OutboxWorkerConfig, WorkerHandle, WorkerStatsSnapshot};

/// Options for [`setup`].
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Drop, recreate and rebuild the index instead of the cold-start check.
    pub force_reindex: bool,
    pub indexer: IndexerConfig,
    pub worker: OutboxWorkerConfig,
}

/// The running synchronization.
pub struct Components {
    /// Repository for search reads and administrative operations.
    pub repository: Arc<ProductSearchRepository>,
    /// The loaded category tree, shared with the repository.
    pub categories: Arc<CategoryPathResolver>,
    worker: WorkerHandle,
}

impl Components {
    pub fn worker_stats(&self) -> WorkerStatsSnapshot {
        self.worker.stats()
    }

    /// Stop the outbox worker and wait for it to exit.
    pub async fn stop(self) -> WorkerStatsSnapshot {
        self.worker.stop().await
    }
}

/// Wire the synchronization in order and start the outbox worker.
///
/// A failure at any step aborts startup: the process must not run against an
/// index it could not create or a category tree it could not load.
pub async fn setup(
    provider: Arc<dyn SearchIndexProvider>,
    category_source: Arc<dyn CategorySource>,
    catalog: Arc<dyn CatalogStore>,
    change_log: Arc<dyn ChangeLog>,
    options: SetupOptions,
    shutdown: &CancellationToken,
) -> Result<Components, SetupError> {
    let categories = Arc::new(CategoryPathResolver::new(category_source));
    categories.load().await?;

    let repository_config =
        ProductSearchRepositoryConfig::for_batch_size(options.indexer.batch_size);
    let repository = Arc::new(ProductSearchRepository::with_config(
        provider,
        Arc::clone(&categories),
        repository_config,
    ));
    repository.ensure_index().await?;

    let indexer = Indexer::with_config(
        Arc::clone(&catalog),
        Arc::clone(&repository),
        options.indexer.clone(),
    );
    if options.force_reindex {
        info!("Forced reindex requested, rebuilding search index");
        repository.delete_index().await?;
        repository.ensure_index().await?;
        indexer.reindex().await?;
    } else {
        indexer.ensure_indexed().await?;
    }

    let worker = OutboxWorker::with_config(
        change_log,
        catalog,
        Arc::clone(&repository),
        options.worker,
    )
    .start(shutdown);

    Ok(Components {
        repository,
        categories,
        worker,
    })
}
