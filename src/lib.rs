//! auditkv - secondary-indexed, versioned document store for audit trails
//!
//! Documents are JSON objects stored in a versioned key-value substrate.
//! Every write stores the payload plus one index entry per indexed field in
//! a single transaction, so reads by any indexed field always see complete
//! documents and every revision stays retrievable.
//!
//! # Quick Start
//!
//! ```ignore
//! use auditkv::{CollectionSettings, Engine, Schema};
//!
//! let engine = Engine::memory();
//! engine.create_collection("trail", &Schema::new(["id", "user"])?, CollectionSettings::default())?;
//!
//! let trail = engine.open_collection("trail")?;
//! trail.indexer().write(br#"{"id":"1","user":"bob"}"#)?;
//!
//! let docs = trail.query().read("user", "bo")?;
//! let revisions = trail.history().history("1")?;
//! ```
//!
//! # Architecture
//!
//! - `auditkv-core`: errors, the substrate contract, schemas, key encoding
//! - `auditkv-storage`: the in-memory versioned store and its commit log
//! - `auditkv-engine`: collections with write, read and history paths
//! - `auditkv-ingest`: line sources and parsers feeding collections

pub use auditkv_core::{
    CollectionSettings, EncodedKeys, Error, HistoryRecord, HistoryRequest, KeyEncoder, KeyValue,
    ParserKind, PrimaryKeySpec, RepositoryKind, Result, ScanRequest, Schema, Substrate,
    SubstrateError, SubstrateResult, TxId,
};
pub use auditkv_engine::{
    Collection, Engine, EngineConfig, History, IngestConfig, Indexer, Page, Query, QueryConfig,
    SchemaStore, StorageConfig, StorageMode, StoredCollection,
};
pub use auditkv_ingest::{
    FileTail, IngestService, IngestStats, LineParser, LineSource, ParseError, ReaderSource,
    StopHandle,
};
pub use auditkv_storage::{StoreOptions, VersionedStore};
