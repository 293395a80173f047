//! Product document types for the search index.
//!
//! This module defines the document structure that is indexed in the search engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::product::Product;

/// Denormalized projection of a catalog product as stored in the search engine.
///
/// The category hierarchy is flattened into `category_path` (root-to-leaf ids),
/// which lets a single term match answer "is this product under category X".
///
/// # Fields
///
/// - `id`: Catalog product id, also used as the document id
/// - `category_path`: Ordered category ids from the root down to `category_id`
/// - `category_name`: Display name of `category_id` at indexing time
/// - `picture`: Image reference, stored but not searchable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDocument {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub vendor: String,
    pub category_id: i32,
    pub category_path: Vec<i32>,
    pub category_name: String,
    pub price: f64,
    pub available: bool,
    pub picture: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductDocument {
    /// Build a document from a catalog row and its resolved category data.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_sync_shared::{Product, ProductDocument};
    ///
    /// let product = Product::new(42, 7, "Kettle");
    /// let doc = ProductDocument::from_product(&product, vec![1, 7], "Kitchen".to_string());
    /// assert_eq!(doc.document_id(), "42");
    /// ```
    pub fn from_product(product: &Product, category_path: Vec<i32>, category_name: String) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            vendor: product.vendor.clone(),
            category_id: product.category_id,
            category_path,
            category_name,
            price: product.price,
            available: product.available,
            picture: product.picture.clone(),
            country: product.country.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }

    /// Generate the document ID used in the search index.
    ///
    /// The document ID is the catalog product id, which makes writes idempotent
    /// upserts and deletes addressable without a lookup.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_product_copies_catalog_fields() {
        let mut product = Product::new(42, 7, "Kettle");
        product.vendor = "Bosch".to_string();
        product.price = 19.5;
        product.available = true;
        product.picture = "https://img.example/42.jpg".to_string();
        product.market_description = "not indexed".to_string();

        let doc = ProductDocument::from_product(&product, vec![1, 3, 7], "Kettles".to_string());

        assert_eq!(doc.id, 42);
        assert_eq!(doc.category_id, 7);
        assert_eq!(doc.category_path, vec![1, 3, 7]);
        assert_eq!(doc.category_name, "Kettles");
        assert_eq!(doc.vendor, "Bosch");
        assert_eq!(doc.price, 19.5);
        assert!(doc.available);
        assert_eq!(doc.picture, "https://img.example/42.jpg");
    }

    #[test]
    fn test_serialized_field_names_match_index_mapping() {
        let doc = ProductDocument::from_product(&Product::new(1, 2, "x"), vec![2], String::new());
        let value = serde_json::to_value(&doc).unwrap();

        for field in [
            "id",
            "name",
            "description",
            "vendor",
            "category_id",
            "category_path",
            "category_name",
            "price",
            "available",
            "picture",
            "country",
            "created_at",
            "updated_at",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
    }
}
