//! Catalog row types.
//!
//! These mirror the authoritative relational catalog. They are read from the
//! catalog store during a full reindex and decoded from change-record payload
//! snapshots by the outbox worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A catalog product row.
///
/// Payload snapshots are serialized with camelCase keys. The PascalCase
/// aliases accept snapshots written by the legacy catalog writer, which
/// emitted struct field names verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "ID")]
    pub id: i32,
    #[serde(alias = "CategoryID")]
    pub category_id: i32,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "URL")]
    pub url: String,
    #[serde(default, alias = "Price")]
    pub price: f64,
    #[serde(default, alias = "Currency")]
    pub currency: String,
    #[serde(default, alias = "Picture")]
    pub picture: String,
    #[serde(default, alias = "Vendor")]
    pub vendor: String,
    #[serde(default, alias = "Country")]
    pub country: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "MarketDescription")]
    pub market_description: String,
    #[serde(default, alias = "Weight")]
    pub weight: Option<f64>,
    #[serde(default, alias = "Available")]
    pub available: bool,
    #[serde(default, alias = "Params")]
    pub params: Option<Value>,
    #[serde(default, alias = "CreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a product with the identifying fields set and everything else empty.
    pub fn new(id: i32, category_id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            category_id,
            name: name.into(),
            url: String::new(),
            price: 0.0,
            currency: String::new(),
            picture: String::new(),
            vendor: String::new(),
            country: String::new(),
            description: String::new(),
            market_description: String::new(),
            weight: None,
            available: false,
            params: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    }
}

/// A node of the category forest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
}

impl Category {
    /// Create a category node.
    pub fn new(id: i32, parent_id: Option<i32>, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
        }
    }
}
