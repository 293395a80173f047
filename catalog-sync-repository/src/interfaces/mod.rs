//! Interface definitions for the search engine and the category catalog.
//!
//! This module defines the abstract `SearchIndexProvider` trait that allows
//! for dependency injection and swappable search backend implementations,
//! and the `CategorySource` trait through which the category tree is loaded.

mod category_source;
mod search_index_provider;

pub use category_source::CategorySource;
pub use search_index_provider::SearchIndexProvider;
