//! Search request construction.
//!
//! Turns a `ProductSearchQuery` into the engine's structured query body.
//! Hard filters live in the bool `filter` clause so they never affect scoring.
//! The category filter is a `post_filter`, applied after aggregations, so
//! category facets count the result set before category narrowing.

use catalog_sync_shared::ProductSearchQuery;
use serde_json::{json, Map, Value};

/// Boosted fields for the full-text clause: name first, then exact name,
/// description and vendor.
pub const TEXT_FIELDS: [&str; 4] = ["name^3", "name.keyword^4", "description", "vendor^2"];

/// Bucket count for the category facet; covers the whole category tree.
pub const CATEGORY_AGG_SIZE: usize = 5000;

/// Bucket count for the vendor facet.
pub const VENDOR_AGG_SIZE: usize = 500;

/// Build the full search request body for `query`.
pub fn build_search_request(query: &ProductSearchQuery) -> Value {
    let mut bool_query = Map::new();

    if query.has_text() {
        bool_query.insert(
            "must".to_string(),
            json!([{
                "multi_match": {
                    "query": query.text.trim(),
                    "fields": TEXT_FIELDS,
                    "type": "best_fields",
                    "operator": "and"
                }
            }]),
        );
    }

    let filters = hard_filters(query);
    if !filters.is_empty() {
        bool_query.insert("filter".to_string(), Value::Array(filters));
    }

    if bool_query.is_empty() {
        bool_query.insert("must".to_string(), json!([{ "match_all": {} }]));
    }

    let mut request = json!({
        "query": { "bool": bool_query },
        "track_total_hits": true,
        "from": query.offset,
        "size": query.effective_limit(),
        "sort": [
            { "_score": { "order": "desc" } },
            { "id": { "order": "asc" } }
        ],
        "aggs": {
            "categories": {
                "terms": { "field": "category_path", "size": CATEGORY_AGG_SIZE }
            },
            "vendors": {
                "terms": { "field": "vendor.keyword", "size": VENDOR_AGG_SIZE }
            },
            "price_stats": {
                "stats": { "field": "price" }
            }
        }
    });

    if !query.category_ids.is_empty() {
        request["post_filter"] = json!({
            "bool": {
                "filter": [{ "terms": { "category_path": query.category_ids } }]
            }
        });
    }

    request
}

fn hard_filters(query: &ProductSearchQuery) -> Vec<Value> {
    let mut filters = Vec::new();

    if query.min_price.is_some() || query.max_price.is_some() {
        let mut range = Map::new();
        if let Some(min) = query.min_price {
            range.insert("gte".to_string(), json!(min));
        }
        if let Some(max) = query.max_price {
            range.insert("lte".to_string(), json!(max));
        }
        filters.push(json!({ "range": { "price": range } }));
    }

    if !query.vendors.is_empty() {
        filters.push(json!({ "terms": { "vendor.keyword": query.vendors } }));
    }

    if let Some(available) = query.available {
        filters.push(json!({ "term": { "available": available } }));
    }

    filters
}
