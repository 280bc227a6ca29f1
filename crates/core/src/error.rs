//! Error types for auditkv
//!
//! Two layers of errors flow through the system:
//!
//! - [`SubstrateError`]: raised by a versioned substrate implementation
//!   (I/O, corruption, malformed requests).
//! - [`Error`]: what engine callers see. Substrate failures are wrapped
//!   together with the phase that failed (write, scan, dereference,
//!   history fetch, schema read/write), so the caller always knows where
//!   an operation stopped.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for substrate operations
pub type SubstrateResult<T> = std::result::Result<T, SubstrateError>;

/// Errors raised by a versioned key-value substrate
#[derive(Debug, Error)]
pub enum SubstrateError {
    /// I/O error (commit log, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persistent data failed validation
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// The request itself is unusable (e.g. zero page size)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// What kind of name failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    /// A collection name
    Collection,
    /// An indexed field name
    Field,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Collection => f.write_str("collection"),
            NameKind::Field => f.write_str("field"),
        }
    }
}

/// Error types visible to engine callers
#[derive(Debug, Error)]
pub enum Error {
    /// The collection has an empty indexed-field list
    #[error("collection '{collection}' has no indexed fields, a primary key is required")]
    SchemaRequired {
        /// Collection name
        collection: String,
    },

    /// The collection was never created
    #[error("collection '{collection}' is not configured, please create it first")]
    NotConfigured {
        /// Collection name
        collection: String,
    },

    /// Exclusive create found an existing collection
    #[error("collection '{collection}' already exists")]
    AlreadyExists {
        /// Collection name
        collection: String,
    },

    /// A collection or field name would make key encoding ambiguous
    #[error("invalid {kind} name '{name}': {reason}")]
    InvalidName {
        /// Which kind of name
        kind: NameKind,
        /// The offending name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Schema definition is unusable (duplicates, empty composite part, ...)
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Stored schema blob could not be decoded
    #[error("corrupt schema for collection '{collection}': {reason}")]
    CorruptSchema {
        /// Collection name
        collection: String,
        /// Decoding failure
        reason: String,
    },

    /// A document lacks one of the primary key fields
    #[error("missing primary key field '{field}' in document")]
    MissingPrimaryKeyField {
        /// Field path that was absent
        field: String,
    },

    /// A document lacks a secondary indexed field
    #[error("missing secondary key field '{field}' in document")]
    MissingSecondaryKeyField {
        /// Field path that was absent
        field: String,
    },

    /// Document bytes are not a JSON object
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The atomic multi-key write was rejected by the substrate
    #[error("could not store document: {0}")]
    WriteFailed(#[source] SubstrateError),

    /// An index prefix scan failed
    #[error("could not scan for documents under '{prefix}': {source}")]
    ScanFailed {
        /// Scan prefix
        prefix: String,
        /// Substrate failure
        #[source]
        source: SubstrateError,
    },

    /// Reading the payload an index entry points at failed
    #[error("could not read document '{key}': {source}")]
    DereferenceFailed {
        /// Payload key
        key: String,
        /// Substrate failure
        #[source]
        source: SubstrateError,
    },

    /// An index entry points at a payload key that does not exist
    #[error("index entry '{index_key}' points at missing payload '{payload_key}'")]
    DanglingIndex {
        /// Index key found by the scan
        index_key: String,
        /// Payload key it referenced
        payload_key: String,
    },

    /// Fetching the revision history of a payload key failed
    #[error("could not read history of '{key}': {source}")]
    HistoryFailed {
        /// Payload key
        key: String,
        /// Substrate failure
        #[source]
        source: SubstrateError,
    },

    /// Reading the collection control keys failed
    #[error("could not read configuration of collection '{collection}': {source}")]
    SchemaReadFailed {
        /// Collection name
        collection: String,
        /// Substrate failure
        #[source]
        source: SubstrateError,
    },

    /// Writing the collection control keys failed
    #[error("could not write configuration of collection '{collection}': {source}")]
    SchemaWriteFailed {
        /// Collection name
        collection: String,
        /// Substrate failure
        #[source]
        source: SubstrateError,
    },

    /// Opening or replaying the substrate failed
    #[error("could not open storage: {0}")]
    StorageOpen(#[source] SubstrateError),

    /// Engine configuration is invalid
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The ingest line source failed
    #[error("could not read line from source: {0}")]
    Source(#[source] io::Error),

    /// Ingestion stopped because a parsed line could not be stored
    #[error("could not store line {line}: {source}")]
    Ingest {
        /// 1-based line number within the source
        line: u64,
        /// Underlying write failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// True for per-document validation failures.
    ///
    /// These are fatal to one write only; the collection is unaffected.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingPrimaryKeyField { .. }
                | Error::MissingSecondaryKeyField { .. }
                | Error::InvalidDocument(_)
        )
    }

    /// True when the collection itself is unusable (never created, empty
    /// or unreadable schema).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::SchemaRequired { .. }
                | Error::NotConfigured { .. }
                | Error::CorruptSchema { .. }
        )
    }
}
