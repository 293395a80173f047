//! # Catalog Sync
//!
//! Keeps the product search index eventually consistent with the relational
//! catalog. The catalog and the index never share a transaction; catalog
//! writers append a change record to the outbox in the same transaction as the
//! mutation, and this crate drains it.
//!
//! ## Architecture
//!
//! 1. **Setup**: Loads the category tree, ensures the index, runs the
//!    cold-start reindex and starts the worker
//! 2. **Indexer**: Rebuilds the whole index from the catalog
//! 3. **Worker**: Polls the outbox and applies each change to the index
//!
//! ## Modules
//!
//! - [`catalog`]: Catalog and change-log contracts and the PostgreSQL implementation
//! - [`config`]: Settings, dependency initialization and startup wiring
//! - [`indexer`]: Full reindex
//! - [`worker`]: Outbox worker
//! - [`errors`]: Error types

pub mod catalog;
pub mod config;
pub mod errors;
pub mod indexer;
pub mod worker;

pub use catalog::{CatalogStore, ChangeLog, PostgresCatalog};
pub use config::{setup, Components, Dependencies, Settings, SetupOptions};
pub use errors::{CatalogError, SetupError, SyncError};
pub use indexer::{Indexer, IndexerConfig};
pub use worker::{OutboxWorker, OutboxWorkerConfig, WorkerHandle, WorkerStatsSnapshot};
