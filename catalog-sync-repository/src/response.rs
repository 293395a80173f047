//! Search response parsing.

use catalog_sync_shared::{
    Aggregations, CategoryFacet, PriceRange, ProductDocument, ProductSearchResult, VendorFacet,
};
use serde::Deserialize;
use serde_json::Value;

use crate::categories::CategoryPathResolver;
use crate::errors::SearchIndexError;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsResponse,
    #[serde(default)]
    aggregations: AggregationsResponse,
}

#[derive(Debug, Deserialize)]
struct HitsResponse {
    total: TotalResponse,
    #[serde(default)]
    hits: Vec<HitResponse>,
}

#[derive(Debug, Deserialize)]
struct TotalResponse {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct HitResponse {
    #[serde(rename = "_source")]
    source: ProductDocument,
}

#[derive(Debug, Default, Deserialize)]
struct AggregationsResponse {
    #[serde(default)]
    categories: TermsBuckets,
    #[serde(default)]
    vendors: TermsBuckets,
    #[serde(default)]
    price_stats: StatsResponse,
}

#[derive(Debug, Default, Deserialize)]
struct TermsBuckets {
    #[serde(default)]
    buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    key: Value,
    doc_count: u64,
}

/// `min`/`max` are null when nothing matched.
#[derive(Debug, Default, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    count: u64,
    min: Option<f64>,
    max: Option<f64>,
}

/// Parse a raw search response into a `ProductSearchResult`.
///
/// Category bucket keys are resolved to display name and parent id through
/// the resolver, so the index never stores facet metadata.
pub fn parse_search_response(
    body: Value,
    categories: &CategoryPathResolver,
) -> Result<ProductSearchResult, SearchIndexError> {
    let response: SearchResponse = serde_json::from_value(body)
        .map_err(|e| SearchIndexError::parse(format!("Invalid search response: {}", e)))?;

    let products = response
        .hits
        .hits
        .into_iter()
        .map(|hit| hit.source)
        .collect();

    let category_facets = response
        .aggregations
        .categories
        .buckets
        .iter()
        .filter_map(|bucket| {
            let id = bucket.key.as_i64().and_then(|k| i32::try_from(k).ok())?;
            Some(CategoryFacet {
                id,
                parent_id: categories.get_parent_id(id),
                name: categories.get_name(id),
                count: bucket.doc_count,
            })
        })
        .collect();

    let vendor_facets = response
        .aggregations
        .vendors
        .buckets
        .iter()
        .filter_map(|bucket| {
            Some(VendorFacet {
                name: bucket.key.as_str()?.to_string(),
                count: bucket.doc_count,
            })
        })
        .collect();

    let stats = response.aggregations.price_stats;
    let price_range = match (stats.count, stats.min, stats.max) {
        (0, _, _) => None,
        (_, Some(min), Some(max)) => Some(PriceRange { min, max }),
        _ => None,
    };

    Ok(ProductSearchResult {
        products,
        total: response.hits.total.value,
        aggregations: Aggregations {
            categories: category_facets,
            vendors: vendor_facets,
            price_range,
        },
    })
}
