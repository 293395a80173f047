//! Search result types for the product index.
//!
//! This module defines the response structures returned from search operations.

use serde::{Deserialize, Serialize};

use crate::types::product_document::ProductDocument;

/// Number of matching documents per category, with the category's place in the tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryFacet {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub count: u64,
}

/// Number of matching documents per vendor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorFacet {
    pub name: String,
    pub count: u64,
}

/// Price bounds across the matched set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Facets computed over the full matched set, before pagination.
///
/// Category counts are computed before the category filter is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Aggregations {
    pub categories: Vec<CategoryFacet>,
    pub vendors: Vec<VendorFacet>,
    /// `None` when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
}

impl Aggregations {
    /// Count for a category, or 0 if the category has no bucket.
    pub fn category_count(&self, category_id: i32) -> u64 {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Count for a vendor, or 0 if the vendor has no bucket.
    pub fn vendor_count(&self, vendor: &str) -> u64 {
        self.vendors
            .iter()
            .find(|v| v.name == vendor)
            .map(|v| v.count)
            .unwrap_or(0)
    }
}

/// Complete search response with results and facets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductSearchResult {
    /// The page of matching documents, ordered by relevance then id.
    pub products: Vec<ProductDocument>,

    /// Total number of matching documents.
    /// May be greater than the number of returned products due to pagination.
    pub total: u64,

    pub aggregations: Aggregations,
}

impl ProductSearchResult {
    /// Create an empty search result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the page holds no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Returns the number of products in this page.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether a product with the given id is on this page.
    pub fn contains(&self, product_id: i32) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }
}
