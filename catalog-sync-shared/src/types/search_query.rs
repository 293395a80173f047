//! Search query types for the product index.
//!
//! This module defines the query structure accepted by the search repository.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: usize = 20;

/// Maximum page size.
pub const MAX_LIMIT: usize = 100;

/// Product search parameters.
///
/// All filters are optional. An empty `text` matches every document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductSearchQuery {
    /// Free-text query.
    #[serde(default)]
    pub text: String,

    /// Restrict results to products under any of these categories (at any depth).
    /// Applied after aggregations so category facets keep their counts.
    #[serde(default)]
    pub category_ids: Vec<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,

    #[serde(default)]
    pub vendors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,

    /// Page size. `0` means [`DEFAULT_LIMIT`]; values above [`MAX_LIMIT`] are capped.
    #[serde(default)]
    pub limit: usize,

    #[serde(default)]
    pub offset: usize,
}

impl ProductSearchQuery {
    /// Create a free-text query with default pagination.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_sync_shared::ProductSearchQuery;
    ///
    /// let query = ProductSearchQuery::text("чайник")
    ///     .with_categories(vec![7])
    ///     .with_limit(50);
    /// assert_eq!(query.effective_limit(), 50);
    /// ```
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Restrict to products under the given categories.
    pub fn with_categories(mut self, category_ids: Vec<i32>) -> Self {
        self.category_ids = category_ids;
        self
    }

    /// Restrict to an inclusive price range. Either bound may be open.
    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    /// Restrict to the given vendors (exact match).
    pub fn with_vendors(mut self, vendors: Vec<String>) -> Self {
        self.vendors = vendors;
        self
    }

    /// Restrict by availability.
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = Some(available);
        self
    }

    /// Set the limit for results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT); // Cap at 100
        self
    }

    /// Set the offset for pagination.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// The page size actually requested from the engine.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            0 => DEFAULT_LIMIT,
            n => n.min(MAX_LIMIT),
        }
    }

    /// Whether the query carries free text.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = ProductSearchQuery::default();
        assert!(!query.has_text());
        assert_eq!(query.effective_limit(), DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);
        assert!(query.category_ids.is_empty());
    }

    #[test]
    fn test_with_limit_caps_at_100() {
        let query = ProductSearchQuery::text("test").with_limit(200);
        assert_eq!(query.limit, 100);
        assert_eq!(query.effective_limit(), 100);
    }

    #[test]
    fn test_effective_limit_caps_raw_field() {
        let query = ProductSearchQuery {
            limit: 500,
            ..ProductSearchQuery::default()
        };
        assert_eq!(query.effective_limit(), MAX_LIMIT);
    }

    #[test]
    fn test_whitespace_text_is_not_text() {
        assert!(!ProductSearchQuery::text("   ").has_text());
        assert!(ProductSearchQuery::text(" tea ").has_text());
    }

    #[test]
    fn test_deserialize_partial_query() {
        let query: ProductSearchQuery =
            serde_json::from_str(r#"{"text": "kettle", "category_ids": [7], "min_price": 10}"#)
                .unwrap();
        assert_eq!(query.text, "kettle");
        assert_eq!(query.category_ids, vec![7]);
        assert_eq!(query.min_price, Some(10.0));
        assert!(query.max_price.is_none());
        assert_eq!(query.effective_limit(), DEFAULT_LIMIT);
    }
}
