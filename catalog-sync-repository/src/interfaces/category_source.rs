//! Category source trait definition.

use async_trait::async_trait;
use catalog_sync_shared::Category;

use crate::errors::SearchIndexError;

/// Supplies the full category collection from the catalog.
///
/// Implemented by the catalog store; the resolver only ever asks for
/// everything at once.
#[async_trait]
pub trait CategorySource: Send + Sync {
    /// Fetch every category node.
    async fn fetch_categories(&self) -> Result<Vec<Category>, SearchIndexError>;
}

/// A fixed category set, useful for tests and tools that already hold the tree.
#[async_trait]
impl CategorySource for Vec<Category> {
    async fn fetch_categories(&self) -> Result<Vec<Category>, SearchIndexError> {
        Ok(self.clone())
    }
}
