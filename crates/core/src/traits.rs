//! The versioned substrate contract
//!
//! The engine never talks to storage directly. Everything it needs from the
//! versioned key-value substrate is captured by [`Substrate`], which lets
//! the embedded store be replaced by a remote one without touching the
//! indexing, query, or history code.

use crate::error::SubstrateResult;
use crate::types::{HistoryRecord, HistoryRequest, KeyValue, ScanRequest, TxId};

/// Versioned key-value substrate
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait Substrate: Send + Sync {
    /// Atomically write every entry as one transaction.
    ///
    /// Either all entries become visible under the returned transaction id,
    /// or none of them do. Writing an existing key adds a new revision of
    /// that key; it never creates a new key.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction could not be committed. A failed
    /// call leaves no trace.
    fn set_all(&self, entries: Vec<KeyValue>) -> SubstrateResult<TxId>;

    /// Point read of the most recent revision.
    ///
    /// Returns `None` if the key has never been written.
    fn get(&self, key: &[u8]) -> SubstrateResult<Option<Vec<u8>>>;

    /// Prefix scan in lexicographic key order, resumable via
    /// [`ScanRequest::seek_key`]. Values are the latest revision.
    fn scan(&self, request: &ScanRequest) -> SubstrateResult<Vec<KeyValue>>;

    /// Revision history of one key, oldest first.
    ///
    /// Returns an empty vector for a key that was never written.
    fn history(&self, request: &HistoryRequest) -> SubstrateResult<Vec<HistoryRecord>>;

    /// Highest transaction id committed so far.
    fn current_tx(&self) -> TxId;
}
