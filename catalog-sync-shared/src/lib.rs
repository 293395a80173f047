//! # Catalog Sync Shared
//!
//! This crate defines shared data structures used across the catalog search
//! synchronization system: catalog rows, outbox change records, the
//! denormalized search document, and the search query/result surface.

pub mod types;

pub use types::change_record::{ChangeAction, ChangeRecord, PRODUCT_ENTITY_TYPE};
pub use types::product::{Category, Product};
pub use types::product_document::ProductDocument;
pub use types::search_query::{ProductSearchQuery, DEFAULT_LIMIT, MAX_LIMIT};
pub use types::search_result::{
    Aggregations, CategoryFacet, PriceRange, ProductSearchResult, VendorFacet,
};
