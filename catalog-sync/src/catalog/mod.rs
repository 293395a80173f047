//! Catalog collaborator contracts.
//!
//! The synchronization reads the catalog through `CatalogStore` and drains the
//! change log through `ChangeLog`. Category loading goes through the
//! repository crate's `CategorySource`. `PostgresCatalog` implements all three.

mod postgres;

pub use postgres::PostgresCatalog;

use std::time::Duration;

use async_trait::async_trait;
use catalog_sync_shared::{ChangeAction, ChangeRecord, Product};
use serde_json::Value;

use crate::errors::CatalogError;

/// Read access to catalog products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch every product, ordered by id.
    async fn fetch_all_products(&self) -> Result<Vec<Product>, CatalogError>;

    /// Fetch one product. `Ok(None)` if it does not exist.
    async fn fetch_product(&self, id: i32) -> Result<Option<Product>, CatalogError>;
}

/// The durable change log (outbox) of catalog mutations.
#[async_trait]
pub trait ChangeLog: Send + Sync {
    /// Append one pending change record and return its id.
    ///
    /// Catalog writers should prefer a transactional append in the same
    /// transaction as the mutation; this variant exists for tools and tests.
    async fn append(
        &self,
        entity_type: &str,
        entity_id: i32,
        action: ChangeAction,
        payload: Option<&Value>,
    ) -> Result<i64, CatalogError>;

    /// Fetch up to `limit` pending records, oldest first (by `created_at`, then `id`).
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ChangeRecord>, CatalogError>;

    /// Mark the given records processed. Already processed records are left untouched.
    async fn mark_processed(&self, ids: &[i64]) -> Result<(), CatalogError>;

    /// Delete processed records older than `older_than`. Returns the number deleted.
    async fn purge_processed(&self, older_than: Duration) -> Result<u64, CatalogError>;
}
