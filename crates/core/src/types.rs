//! Request and response types shared between the engine and substrates
//!
//! Keys and values are raw bytes at this layer. The engine only ever
//! produces UTF-8 keys (see [`crate::key`]), but substrates must not rely
//! on that.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the substrate to one atomic multi-key write.
///
/// Transaction ids are strictly increasing across all keys and impose a
/// total order on writes. The first committed transaction is `TxId(1)`;
/// `TxId::ZERO` means "nothing committed yet".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TxId(u64);

impl TxId {
    /// No transaction has been committed
    pub const ZERO: TxId = TxId(0);

    /// Wrap a raw transaction number
    pub const fn new(id: u64) -> Self {
        TxId(id)
    }

    /// Raw transaction number
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The id following this one
    pub const fn next(self) -> Self {
        TxId(self.0 + 1)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key/value pair, used both for writes and for scan results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Key bytes
    pub key: Vec<u8>,
    /// Value bytes
    pub value: Vec<u8>,
}

impl KeyValue {
    /// Create a key/value pair
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Key rendered as text, lossy for non UTF-8 keys
    pub fn key_str(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

/// Prefix scan request.
///
/// Returns keys starting with `prefix` and strictly greater than
/// `seek_key`, in lexicographic byte order, at most `limit` of them.
/// An empty `seek_key` starts at the beginning of the prefix range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Key prefix to match
    pub prefix: Vec<u8>,
    /// Exclusive resume point (last key of the previous page)
    pub seek_key: Vec<u8>,
    /// Maximum number of entries to return
    pub limit: usize,
}

impl ScanRequest {
    /// Scan from the beginning of `prefix`
    pub fn new(prefix: impl Into<Vec<u8>>, limit: usize) -> Self {
        Self {
            prefix: prefix.into(),
            seek_key: Vec::new(),
            limit,
        }
    }

    /// Resume after `seek_key`
    pub fn after(mut self, seek_key: impl Into<Vec<u8>>) -> Self {
        self.seek_key = seek_key.into();
        self
    }
}

/// Revision history request for a single key.
///
/// Revisions are returned oldest first, skipping the first `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    /// Key whose revisions are requested
    pub key: Vec<u8>,
    /// Number of oldest revisions to skip
    pub offset: u64,
    /// Maximum number of revisions to return
    pub limit: usize,
}

/// One substrate-native revision of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Value bytes as written in that revision
    pub entry: Vec<u8>,
    /// Per-key revision number, starting at 1
    pub revision: u64,
    /// Transaction that wrote this revision
    pub tx_id: TxId,
}
