//! Error types for catalog search synchronization.

use catalog_sync_repository::SearchIndexError;
use thiserror::Error;

/// Errors from the catalog and change-log store.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Database query or connection failure.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A JSON value could not be encoded or decoded.
    #[error("Payload error: {0}")]
    PayloadError(#[from] serde_json::Error),

    /// An argument the store cannot represent (e.g., an out-of-range retention).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CatalogError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<CatalogError> for SearchIndexError {
    fn from(err: CatalogError) -> Self {
        SearchIndexError::category_source(err.to_string())
    }
}

/// Errors raised while applying catalog changes to the search index.
///
/// Catalog and search failures are transient: the affected change record is
/// retried on the next tick. A malformed record fails the same way every time.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The catalog or change log could not be read or written.
    #[error("Catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    /// The search engine rejected or failed an operation.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),

    /// A change record whose contents can never be applied.
    #[error("Malformed change record {record_id}: {reason}")]
    MalformedRecord { record_id: i64, reason: String },
}

impl SyncError {
    /// Create a malformed record error.
    pub fn malformed(record_id: i64, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record_id,
            reason: reason.into(),
        }
    }

    /// Whether retrying cannot succeed.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}

/// Errors that can occur while wiring or starting the synchronization.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The search engine never became reachable.
    #[error("Search engine unavailable: {0}")]
    SearchUnavailable(String),

    /// Database connection failure.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Category loading or index creation failed.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),

    /// The cold-start or forced reindex failed.
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
}

impl SetupError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a search unavailable error.
    pub fn search_unavailable(msg: impl Into<String>) -> Self {
        Self::SearchUnavailable(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_is_distinguished() {
        let malformed = SyncError::malformed(7, "expected i32");
        assert!(malformed.is_malformed());
        assert_eq!(
            malformed.to_string(),
            "Malformed change record 7: expected i32"
        );

        let transient = SyncError::from(SearchIndexError::connection("refused"));
        assert!(!transient.is_malformed());
    }

    #[test]
    fn test_catalog_error_maps_to_category_source() {
        let error: SearchIndexError = CatalogError::invalid_input("bad").into();
        assert!(matches!(error, SearchIndexError::CategorySourceError(_)));
    }
}
