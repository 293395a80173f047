//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use catalog_sync_shared::ProductDocument;
use opensearch::{
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesPutSettingsParts,
        IndicesRefreshParts,
    },
    BulkParts, CountParts, DeleteParts, IndexParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::index_config::{get_index_settings, get_reconciled_settings, IndexConfig};
use crate::types::{BatchOperationResult, BatchOperationSummary};

/// Error type OpenSearch returns when creating an index that already exists.
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// OpenSearch provider implementation.
///
/// Provides full-text search capabilities using OpenSearch as the backend.
///
/// # Example
///
/// ```ignore
/// use catalog_sync_repository::opensearch::{IndexConfig, OpenSearchProvider};
///
/// let provider = OpenSearchProvider::new("http://localhost:9200", IndexConfig::default()).await?;
/// provider.ensure_index_exists().await?;
/// provider.index_document(&document).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// No request is sent; use [`SearchIndexProvider::ping`] to check connectivity.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - The index configuration
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub async fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            index = %index_config.name,
            "Created OpenSearch provider"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    fn index_name(&self) -> &str {
        &self.index_config.name
    }

    /// Read the body of a failed response for error reporting.
    async fn error_body(response: Response) -> String {
        response.text().await.unwrap_or_default()
    }

    /// Reconcile mutable settings on an existing index.
    ///
    /// Failure here leaves a working index with a smaller result window, so it
    /// is logged rather than propagated.
    async fn reconcile_settings(&self) {
        let result = self
            .client
            .indices()
            .put_settings(IndicesPutSettingsParts::Index(&[self.index_name()]))
            .body(get_reconciled_settings(&self.index_config))
            .send()
            .await;

        match result {
            Ok(response) if response.status_code().is_success() => {
                debug!(index = %self.index_name(), "Index settings reconciled");
            }
            Ok(response) => {
                let status = response.status_code();
                let body = Self::error_body(response).await;
                warn!(status = %status, body = %body, "Failed to reconcile index settings");
            }
            Err(e) => {
                warn!(error = %e, "Failed to reconcile index settings");
            }
        }
    }

    /// Convert a bulk API response body into a per-item summary.
    fn summarize_bulk_response(body: &Value) -> Result<BatchOperationSummary, SearchIndexError> {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchIndexError::parse("Bulk response has no items array"))?;

        let results = items
            .iter()
            .map(|item| {
                // Each item is keyed by its action name ("index" for upserts).
                let outcome = item
                    .as_object()
                    .and_then(|obj| obj.values().next())
                    .cloned()
                    .unwrap_or(Value::Null);

                let document_id = outcome
                    .get("_id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();

                match outcome.get("error") {
                    Some(err) if !err.is_null() => {
                        let reason = err
                            .get("reason")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| err.to_string());
                        BatchOperationResult::failed(document_id, SearchIndexError::index(reason))
                    }
                    _ => BatchOperationResult::succeeded(document_id),
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    /// Ensure the product index exists, creating it with the fixed schema if absent.
    ///
    /// If the index is present, only `max_result_window` is reconciled. A
    /// concurrent creation by another process surfaces as
    /// `resource_already_exists_exception` and is treated as success.
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index_name()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if response.status_code().is_success() {
            debug!(index = %self.index_name(), "Index already exists");
            self.reconcile_settings().await;
            return Ok(());
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(self.index_name()))
            .body(get_index_settings(&self.index_config))
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            if error_body.contains(ALREADY_EXISTS_ERROR) {
                info!(index = %self.index_name(), "Index was created concurrently");
                return Ok(());
            }
            error!(status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Create index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %self.index_name(), "Created search index");
        Ok(())
    }

    async fn index_document(&self, document: &ProductDocument) -> Result<(), SearchIndexError> {
        let doc_id = document.document_id();

        let response = self
            .client
            .index(IndexParts::IndexId(self.index_name(), &doc_id))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchIndexError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Index request failed");
            return Err(SearchIndexError::index(format!(
                "Index failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document indexed");
        Ok(())
    }

    /// Upsert many documents with one `_bulk` request.
    ///
    /// The engine answers 200 even when individual items fail, so the per-item
    /// outcomes are read from the response body.
    async fn bulk_index_documents(
        &self,
        documents: &[ProductDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::default());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            let source = serde_json::to_value(document)
                .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
            body.push(JsonBody::new(json!({ "index": { "_id": document.document_id() } })));
            body.push(JsonBody::new(source));
        }

        let response = self
            .client
            .bulk(BulkParts::Index(self.index_name()))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::summarize_bulk_response(&response_body)?;
        debug!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }

    async fn delete_document(&self, product_id: i32) -> Result<(), SearchIndexError> {
        let doc_id = product_id.to_string();

        let response = self
            .client
            .delete(DeleteParts::IndexId(self.index_name(), &doc_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(doc_id = %doc_id, "Document deleted");
        Ok(())
    }

    async fn search(&self, request: &Value) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[self.index_name()]))
            .body(request)
            .send()
            .await
            .map_err(|e| SearchIndexError::search(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(SearchIndexError::search(format!(
                "Search failed with status {}: {}",
                status, error_body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))
    }

    async fn count_documents(&self) -> Result<u64, SearchIndexError> {
        let response = self
            .client
            .count(CountParts::Index(&[self.index_name()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(0);
        }
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            return Err(SearchIndexError::search(format!(
                "Count failed with status {}: {}",
                status, error_body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchIndexError::parse("Count response has no count field"))
    }

    async fn refresh(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[self.index_name()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = Self::error_body(response).await;
            return Err(SearchIndexError::index(format!(
                "Refresh failed with status {}: {}",
                status, error_body
            )));
        }
        Ok(())
    }

    async fn delete_index(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[self.index_name()]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = Self::error_body(response).await;
            return Err(SearchIndexError::delete(format!(
                "Delete index failed with status {}: {}",
                status, error_body
            )));
        }

        info!(index = %self.index_name(), "Deleted search index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_bulk_response_all_succeeded() {
        let body = json!({
            "took": 3,
            "errors": false,
            "items": [
                { "index": { "_id": "1", "status": 201, "result": "created" } },
                { "index": { "_id": "2", "status": 200, "result": "updated" } }
            ]
        });

        let summary = OpenSearchProvider::summarize_bulk_response(&body).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(summary.is_complete_success());
    }

    #[test]
    fn test_summarize_bulk_response_partial_failure() {
        let body = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                { "index": {
                    "_id": "2",
                    "status": 400,
                    "error": { "type": "mapper_parsing_exception", "reason": "failed to parse field [price]" }
                } }
            ]
        });

        let summary = OpenSearchProvider::summarize_bulk_response(&body).unwrap();
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);

        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.document_id, "2");
        assert!(failure
            .error
            .as_ref()
            .unwrap()
            .to_string()
            .contains("failed to parse field [price]"));
    }

    #[test]
    fn test_summarize_bulk_response_without_items() {
        let result = OpenSearchProvider::summarize_bulk_response(&json!({ "errors": false }));
        assert!(matches!(result, Err(SearchIndexError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_url() {
        let result = OpenSearchProvider::new("not a url", IndexConfig::default()).await;
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }
}
