//! This module defines the core data structures and types used across the
//! catalog search synchronization system.

pub mod change_record;
pub mod product;
pub mod product_document;
pub mod search_query;
pub mod search_result;

pub use change_record::{ChangeAction, ChangeRecord};
pub use product::{Category, Product};
pub use product_document::ProductDocument;
pub use search_query::ProductSearchQuery;
pub use search_result::{Aggregations, ProductSearchResult};
