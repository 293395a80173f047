//! Outbox worker.
//!
//! Drains pending change records into incremental index updates on a fixed
//! poll interval, and periodically purges processed records past retention.
//!
//! Records are applied one at a time in log order, so mutations to the same
//! product always reach the index in the order they were committed.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use catalog_sync_repository::ProductSearchRepository;
use catalog_sync_shared::{ChangeAction, ChangeRecord};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogStore, ChangeLog};
use crate::errors::SyncError;

/// Configuration for the outbox worker.
#[derive(Debug, Clone)]
pub struct OutboxWorkerConfig {
    /// Maximum number of change records fetched per tick.
    pub batch_size: usize,
    /// Delay between ticks.
    pub poll_interval: Duration,
    /// Minimum delay between retention sweeps.
    pub cleanup_interval: Duration,
    /// Age after which processed records are purged.
    pub retention: Duration,
    /// Failed attempts after which a malformed record is marked processed
    /// without being applied. `0` retries forever. Catalog and search
    /// failures never count.
    pub max_attempts: u32,
}

impl Default for OutboxWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            poll_interval: Duration::from_secs(2),
            cleanup_interval: Duration::from_secs(60 * 60),
            retention: Duration::from_secs(7 * 24 * 60 * 60),
            max_attempts: 10,
        }
    }
}

/// Running totals since the worker was created.
#[derive(Debug, Default)]
pub struct WorkerStats {
    processed: AtomicU64,
    failed: AtomicU64,
    poisoned: AtomicU64,
    purged: AtomicU64,
}

impl WorkerStats {
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            poisoned: self.poisoned.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`WorkerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStatsSnapshot {
    /// Records marked processed, including unrelated entity types and poisoned records.
    pub processed: u64,
    /// Failed apply attempts.
    pub failed: u64,
    /// Records given up on after reaching the attempt limit.
    pub poisoned: u64,
    /// Processed records removed by the retention sweep.
    pub purged: u64,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Records fetched from the log.
    pub fetched: usize,
    /// Ids marked processed, in log order.
    pub handled: Vec<i64>,
    /// Records that failed and stay pending.
    pub failed: usize,
    /// Records left pending because an earlier record for the same product failed.
    pub deferred: usize,
    /// Records marked processed after reaching the attempt limit.
    pub poisoned: usize,
}

/// Steady-state synchronization loop over the change log.
///
/// Delivery is at-least-once: a record is marked processed only after its
/// index write succeeded, and index writes are idempotent by product id.
pub struct OutboxWorker {
    change_log: Arc<dyn ChangeLog>,
    catalog: Arc<dyn CatalogStore>,
    repository: Arc<ProductSearchRepository>,
    config: OutboxWorkerConfig,
    attempts: HashMap<i64, u32>,
    last_cleanup: Option<Instant>,
    stats: Arc<WorkerStats>,
}

impl OutboxWorker {
    /// Create a new worker with the default configuration.
    pub fn new(
        change_log: Arc<dyn ChangeLog>,
        catalog: Arc<dyn CatalogStore>,
        repository: Arc<ProductSearchRepository>,
    ) -> Self {
        Self::with_config(change_log, catalog, repository, OutboxWorkerConfig::default())
    }

    /// Create a new worker with custom configuration.
    pub fn with_config(
        change_log: Arc<dyn ChangeLog>,
        catalog: Arc<dyn CatalogStore>,
        repository: Arc<ProductSearchRepository>,
        config: OutboxWorkerConfig,
    ) -> Self {
        Self {
            change_log,
            catalog,
            repository,
            config,
            attempts: HashMap::new(),
            last_cleanup: None,
            stats: Arc::new(WorkerStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn the loop on the runtime.
    ///
    /// The loop stops when `shutdown` (or the returned handle) is cancelled.
    pub fn start(self, shutdown: &CancellationToken) -> WorkerHandle {
        let token = shutdown.child_token();
        let stats = self.stats();
        let handle = tokio::spawn(self.run(token.clone()));

        info!("Outbox worker started");
        WorkerHandle {
            token,
            handle,
            stats,
        }
    }

    async fn run(mut self, token: CancellationToken) {
        let mut ticker = interval_at(
            Instant::now() + self.config.poll_interval,
            self.config.poll_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = self.tick() => {}
                    }
                }
            }
        }

        let stats = self.stats.snapshot();
        info!(
            processed = stats.processed,
            failed = stats.failed,
            poisoned = stats.poisoned,
            purged = stats.purged,
            "Outbox worker stopped"
        );
    }

    /// Run one batch and, if due, a retention sweep.
    pub async fn tick(&mut self) {
        if let Err(e) = self.process_batch().await {
            error!(error = %e, "Outbox worker error");
        }
        self.maybe_cleanup().await;
    }

    /// Fetch and apply one batch of pending records.
    ///
    /// A failing record is left pending and does not stop the batch, except
    /// that later records for the same product are also left pending so they
    /// cannot overtake it. Only malformed records are ever given up on.
    pub async fn process_batch(&mut self) -> Result<BatchOutcome, SyncError> {
        let records = self
            .change_log
            .fetch_pending(self.config.batch_size)
            .await?;

        let mut outcome = BatchOutcome {
            fetched: records.len(),
            ..BatchOutcome::default()
        };
        if records.is_empty() {
            self.attempts.clear();
            return Ok(outcome);
        }

        let mut blocked: HashSet<i32> = HashSet::new();
        for record in &records {
            if !record.is_product() {
                debug!(
                    record_id = record.id,
                    entity_type = %record.entity_type,
                    "Skipping change record for unrelated entity type"
                );
                outcome.handled.push(record.id);
                continue;
            }

            if blocked.contains(&record.entity_id) {
                outcome.deferred += 1;
                continue;
            }

            match self.apply(record).await {
                Ok(()) => {
                    self.attempts.remove(&record.id);
                    outcome.handled.push(record.id);
                }
                Err(e) => {
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);

                    // Only malformed records spend the attempt budget; outages retry forever.
                    let attempts = if e.is_malformed() {
                        let count = self.attempts.entry(record.id).or_insert(0);
                        *count += 1;
                        *count
                    } else {
                        self.attempts.get(&record.id).copied().unwrap_or(0)
                    };

                    if e.is_malformed()
                        && self.config.max_attempts > 0
                        && attempts >= self.config.max_attempts
                    {
                        error!(
                            record_id = record.id,
                            entity_id = record.entity_id,
                            action = %record.action,
                            attempts,
                            malformed = e.is_malformed(),
                            error = %e,
                            "Giving up on change record, marking processed"
                        );
                        self.attempts.remove(&record.id);
                        outcome.handled.push(record.id);
                        outcome.poisoned += 1;
                    } else {
                        warn!(
                            record_id = record.id,
                            entity_id = record.entity_id,
                            action = %record.action,
                            attempts,
                            malformed = e.is_malformed(),
                            error = %e,
                            "Process change record failed"
                        );
                        blocked.insert(record.entity_id);
                        outcome.failed += 1;
                    }
                }
            }
        }

        let pending: HashSet<i64> = records.iter().map(|r| r.id).collect();
        self.attempts.retain(|id, _| pending.contains(id));

        if !outcome.handled.is_empty() {
            self.change_log.mark_processed(&outcome.handled).await?;

            self.stats
                .processed
                .fetch_add(outcome.handled.len() as u64, Ordering::Relaxed);
            self.stats
                .poisoned
                .fetch_add(outcome.poisoned as u64, Ordering::Relaxed);
        }

        let stats = self.stats.snapshot();
        info!(
            fetched = outcome.fetched,
            handled = outcome.handled.len(),
            failed = outcome.failed,
            deferred = outcome.deferred,
            poisoned = outcome.poisoned,
            total_processed = stats.processed,
            total_failed = stats.failed,
            "Outbox batch processed"
        );

        Ok(outcome)
    }

    /// Apply one product change record to the index.
    async fn apply(&self, record: &ChangeRecord) -> Result<(), SyncError> {
        match record.action {
            ChangeAction::Create | ChangeAction::Update => {
                // The snapshot captured at write time wins over the current row.
                let product = match record.product_snapshot() {
                    Ok(Some(product)) => {
                        if product.id != record.entity_id {
                            return Err(SyncError::malformed(
                                record.id,
                                format!(
                                    "payload id {} does not match entity id {}",
                                    product.id, record.entity_id
                                ),
                            ));
                        }
                        Some(product)
                    }
                    Ok(None) => self.catalog.fetch_product(record.entity_id).await?,
                    Err(e) => return Err(SyncError::malformed(record.id, e.to_string())),
                };

                match product {
                    Some(product) => {
                        let document = self.repository.document_for(&product);
                        self.repository.index_product(&document).await?;
                    }
                    None => {
                        debug!(
                            record_id = record.id,
                            entity_id = record.entity_id,
                            "Product no longer in catalog, nothing to index"
                        );
                    }
                }
            }
            ChangeAction::Delete => {
                self.repository.delete_product(record.entity_id).await?;
            }
            ChangeAction::Unknown => {
                warn!(
                    record_id = record.id,
                    entity_id = record.entity_id,
                    "Unknown change action, skipping"
                );
            }
        }
        Ok(())
    }

    /// Purge processed records past retention if the sweep is due.
    async fn maybe_cleanup(&mut self) {
        if let Some(last) = self.last_cleanup {
            if last.elapsed() < self.config.cleanup_interval {
                return;
            }
        }

        match self.change_log.purge_processed(self.config.retention).await {
            Ok(deleted) => {
                self.last_cleanup = Some(Instant::now());
                if deleted > 0 {
                    self.stats.purged.fetch_add(deleted, Ordering::Relaxed);
                    info!(deleted, "Outbox cleanup complete");
                }
            }
            Err(e) => {
                error!(error = %e, "Outbox cleanup error");
            }
        }
    }
}

/// Handle to a running [`OutboxWorker`].
pub struct WorkerHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
    stats: Arc<WorkerStats>,
}

impl WorkerHandle {
    pub fn stats(&self) -> WorkerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the loop and wait until it has fully exited.
    pub async fn stop(self) -> WorkerStatsSnapshot {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            error!(error = %e, "Outbox worker task failed");
        }
        self.stats.snapshot()
    }
}
