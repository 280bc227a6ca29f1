//! Document indexing and query engine for auditkv
//!
//! This crate sits on top of a versioned substrate:
//! - Engine: opens the substrate from configuration, hands out collections
//! - SchemaStore: persists each collection's indexed fields and settings
//! - Indexer: one atomic transaction per document (write path)
//! - Query: prefix scans over an index, dereferenced to payloads (read path)
//! - History: every revision of one document (history path)
//!
//! The engine holds no locks of its own. Ordering and atomicity come from
//! the substrate's multi-key transactions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod history;
pub mod indexer;
pub mod query;
pub mod schema_store;

pub use config::{EngineConfig, IngestConfig, QueryConfig, StorageConfig, StorageMode};
pub use engine::{Collection, Engine};
pub use history::History;
pub use indexer::Indexer;
pub use query::{Page, Query};
pub use schema_store::{SchemaStore, StoredCollection};
