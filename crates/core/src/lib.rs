//! Core types and traits for auditkv
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: engine and substrate error hierarchy
//! - Substrate: the versioned key-value store contract
//! - Schema: indexed-field lists, primary key specifications, name rules
//! - KeyEncoder: the document-to-keys encoding protocol
//! - CollectionSettings: closed enums for repository and parser kinds

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod schema;
pub mod traits;
pub mod types;

pub use error::{Error, NameKind, Result, SubstrateError, SubstrateResult};
pub use key::{EncodedKeys, KeyEncoder};
pub use schema::{
    validate_collection_name, validate_field_name, CollectionSettings, ParserKind,
    PrimaryKeySpec, RepositoryKind, Schema,
};
pub use traits::Substrate;
pub use types::{HistoryRecord, HistoryRequest, KeyValue, ScanRequest, TxId};
