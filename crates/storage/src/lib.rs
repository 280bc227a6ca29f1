//! Storage layer for auditkv
//!
//! This crate implements the embedded versioned substrate:
//! - VersionedStore: BTreeMap-based storage with RwLock and full revision history
//! - VersionChain: per-key revisions, oldest first
//! - CommitLog: CRC-framed append-only log for durable mode
//! - Transaction ids from an AtomicU64, one per `set_all`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commit_log;
pub mod store;
pub mod stored_value;

pub use commit_log::{CommitLog, LogRecord, Replay};
pub use store::{StoreOptions, VersionedStore};
pub use stored_value::{StoredValue, VersionChain};
