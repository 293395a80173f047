//! Repository configuration.

/// Bulk request size used when none is configured.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Limits applied by `ProductSearchRepository`.
#[derive(Debug, Clone)]
pub struct ProductSearchRepositoryConfig {
    /// Largest number of documents accepted by a single `bulk_index` call.
    /// Larger batches are rejected before anything is sent to the engine.
    pub max_batch_size: usize,
}

impl Default for ProductSearchRepositoryConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl ProductSearchRepositoryConfig {
    /// Accept bulk batches of up to `max_batch_size` documents.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self { max_batch_size }
    }

    /// A config whose limit admits batches of `batch_size`, never below the default.
    pub fn for_batch_size(batch_size: usize) -> Self {
        Self::with_max_batch_size(batch_size.max(DEFAULT_MAX_BATCH_SIZE))
    }
}
