//! OpenSearch index configuration and mappings.
//!
//! This module defines the index settings and mappings for the product search index.

use serde_json::{json, Value};

/// The default name of the product index.
pub const INDEX_NAME: &str = "products";

/// Result window large enough for deep pagination over the whole catalog.
pub const MAX_RESULT_WINDOW: u64 = 100_000;

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The index name used for all operations.
    pub name: String,
    /// `index.max_result_window`, the only setting reconciled on existing indexes.
    pub max_result_window: u64,
}

impl IndexConfig {
    /// Create a new index configuration.
    ///
    /// # Arguments
    ///
    /// * `name` - The index name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_result_window: MAX_RESULT_WINDOW,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(INDEX_NAME)
    }
}

/// Get the index settings and mappings for the product search index.
///
/// The configuration includes:
/// - **catalog_text**: standard tokenizer, lowercase, Russian stop words and stemming
///   for `name`, `description` and `category_name`
/// - **name.autocomplete**: edge n-grams (2..15) indexed, plain lowercase at query time
/// - **Keyword fields**: `name.keyword`, `vendor.keyword`, `country` for exact matching
///   and aggregations
/// - **category_path**: integer array, so "under category X" is a single term match
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 0 replicas (single node)
pub fn get_index_settings(config: &IndexConfig) -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0,
            "max_result_window": config.max_result_window,
            "analysis": {
                "filter": {
                    "catalog_stop": {
                        "type": "stop",
                        "stopwords": "_russian_"
                    },
                    "catalog_stemmer": {
                        "type": "stemmer",
                        "language": "russian"
                    },
                    "autocomplete_edge_ngram": {
                        "type": "edge_ngram",
                        "min_gram": 2,
                        "max_gram": 15
                    }
                },
                "analyzer": {
                    "catalog_text": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", "catalog_stop", "catalog_stemmer"]
                    },
                    "autocomplete_index": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", "autocomplete_edge_ngram"]
                    },
                    "autocomplete_search": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase"]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "id": { "type": "integer" },
                "name": {
                    "type": "text",
                    "analyzer": "catalog_text",
                    "fields": {
                        "autocomplete": {
                            "type": "text",
                            "analyzer": "autocomplete_index",
                            "search_analyzer": "autocomplete_search"
                        },
                        "keyword": {
                            "type": "keyword"
                        }
                    }
                },
                "description": {
                    "type": "text",
                    "analyzer": "catalog_text"
                },
                "vendor": {
                    "type": "text",
                    "fields": {
                        "keyword": { "type": "keyword" }
                    }
                },
                "category_id": { "type": "integer" },
                "category_path": { "type": "integer" },
                "category_name": {
                    "type": "text",
                    "analyzer": "catalog_text"
                },
                "price": { "type": "float" },
                "available": { "type": "boolean" },
                "picture": { "type": "keyword", "index": false },
                "country": { "type": "keyword" },
                "created_at": { "type": "date" },
                "updated_at": { "type": "date" }
            }
        }
    })
}

/// Settings body applied to an existing index. Only dynamic settings belong here.
pub fn get_reconciled_settings(config: &IndexConfig) -> Value {
    json!({
        "index": {
            "max_result_window": config.max_result_window
        }
    })
}
