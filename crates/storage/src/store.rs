//! VersionedStore: embedded versioned key-value substrate
//!
//! This module implements the [`Substrate`] trait using:
//! - `BTreeMap<Vec<u8>, VersionChain>` for ordered keys with full revision history
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for the monotonically increasing transaction counter
//! - An optional [`CommitLog`] for durability across restarts
//!
//! # Design Notes
//!
//! - **One lock per transaction**: every entry of a `set_all` is applied
//!   under a single write-lock acquisition, so readers see all of a
//!   transaction or none of it
//! - **Log before apply**: in durable mode the record is appended before the
//!   map is touched; a failed append leaves the map and the counter unchanged
//! - **Duplicate keys**: when one `set_all` names a key twice, the last value
//!   wins and the key gets a single revision

use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use auditkv_core::{
    HistoryRecord, HistoryRequest, KeyValue, ScanRequest, Substrate, SubstrateError,
    SubstrateResult, TxId,
};

use crate::commit_log::{CommitLog, LogRecord};
use crate::stored_value::VersionChain;

/// Options for opening a durable store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOptions {
    /// fsync the commit log after every transaction
    pub sync_on_commit: bool,
}

/// Embedded versioned substrate
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`. Cheap to share
/// behind an `Arc`.
#[derive(Debug)]
pub struct VersionedStore {
    /// Ordered map from key to its revisions
    data: RwLock<BTreeMap<Vec<u8>, VersionChain>>,
    /// Highest committed transaction id
    tx: AtomicU64,
    /// Commit log, present in durable mode
    log: Option<Mutex<CommitLog>>,
    /// Data directory, present in durable mode
    data_dir: Option<PathBuf>,
}

impl VersionedStore {
    /// Create an empty in-memory store
    ///
    /// Nothing written to it survives the process.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            tx: AtomicU64::new(0),
            log: None,
            data_dir: None,
        }
    }

    /// Open a durable store in `dir`, replaying its commit log.
    ///
    /// Creates the directory and an empty log if needed.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and on a corrupt log. A torn final record is not
    /// an error; it is discarded.
    pub fn open(dir: impl AsRef<Path>, options: StoreOptions) -> SubstrateResult<Self> {
        let dir = dir.as_ref();
        let (log, replay) = CommitLog::open(dir, options.sync_on_commit)?;

        let mut data = BTreeMap::new();
        let mut last = TxId::ZERO;
        for record in replay.records {
            Self::apply(&mut data, record.entries, record.tx_id);
            last = record.tx_id;
        }

        info!(
            target: "auditkv::storage",
            path = %dir.display(),
            keys = data.len(),
            tx_id = last.as_u64(),
            "Opened durable store"
        );

        Ok(Self {
            data: RwLock::new(data),
            tx: AtomicU64::new(last.as_u64()),
            log: Some(Mutex::new(log)),
            data_dir: Some(dir.to_path_buf()),
        })
    }

    /// Whether writes are persisted to a commit log
    pub fn is_durable(&self) -> bool {
        self.log.is_some()
    }

    /// Data directory of a durable store
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Number of distinct keys ever written
    pub fn key_count(&self) -> usize {
        self.data.read().len()
    }

    /// Collapse duplicate keys, last value wins, keeping first-seen order
    fn dedup(entries: Vec<KeyValue>) -> Vec<KeyValue> {
        let mut position: BTreeMap<Vec<u8>, usize> = BTreeMap::new();
        let mut out: Vec<KeyValue> = Vec::with_capacity(entries.len());
        for entry in entries {
            match position.get(&entry.key) {
                Some(&i) => out[i].value = entry.value,
                None => {
                    position.insert(entry.key.clone(), out.len());
                    out.push(entry);
                }
            }
        }
        out
    }

    /// Apply a deduplicated batch under an already-held write lock
    fn apply(data: &mut BTreeMap<Vec<u8>, VersionChain>, entries: Vec<KeyValue>, tx_id: TxId) {
        for KeyValue { key, value } in entries {
            match data.get_mut(&key) {
                Some(chain) => chain.push(value, tx_id),
                None => {
                    data.insert(key, VersionChain::new(value, tx_id));
                }
            }
        }
    }
}

impl Default for VersionedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Substrate for VersionedStore {
    fn set_all(&self, entries: Vec<KeyValue>) -> SubstrateResult<TxId> {
        if entries.is_empty() {
            return Err(SubstrateError::InvalidRequest(
                "transaction has no entries".to_string(),
            ));
        }
        if entries.iter().any(|e| e.key.is_empty()) {
            return Err(SubstrateError::InvalidRequest(
                "empty key in transaction".to_string(),
            ));
        }
        let entries = Self::dedup(entries);

        let mut data = self.data.write();
        let tx_id = TxId::new(self.tx.load(Ordering::Acquire)).next();

        let entries = match &self.log {
            Some(log) => {
                let record = LogRecord { tx_id, entries };
                log.lock().append(&record)?;
                record.entries
            }
            None => entries,
        };

        let count = entries.len();
        Self::apply(&mut data, entries, tx_id);
        self.tx.store(tx_id.as_u64(), Ordering::Release);
        drop(data);

        debug!(
            target: "auditkv::storage",
            tx_id = tx_id.as_u64(),
            entries = count,
            "Committed transaction"
        );
        Ok(tx_id)
    }

    fn get(&self, key: &[u8]) -> SubstrateResult<Option<Vec<u8>>> {
        let data = self.data.read();
        Ok(data.get(key).map(|chain| chain.latest().value().to_vec()))
    }

    fn scan(&self, request: &ScanRequest) -> SubstrateResult<Vec<KeyValue>> {
        if request.limit == 0 {
            return Err(SubstrateError::InvalidRequest(
                "scan limit must be at least 1".to_string(),
            ));
        }

        let start = if !request.seek_key.is_empty() && request.seek_key >= request.prefix {
            Bound::Excluded(request.seek_key.clone())
        } else {
            Bound::Included(request.prefix.clone())
        };

        let data = self.data.read();
        let page = data
            .range((start, Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(&request.prefix))
            .take(request.limit)
            .map(|(key, chain)| KeyValue::new(key.clone(), chain.latest().value().to_vec()))
            .collect();
        Ok(page)
    }

    fn history(&self, request: &HistoryRequest) -> SubstrateResult<Vec<HistoryRecord>> {
        if request.limit == 0 {
            return Err(SubstrateError::InvalidRequest(
                "history limit must be at least 1".to_string(),
            ));
        }

        let data = self.data.read();
        let records = match data.get(&request.key) {
            Some(chain) => chain
                .history(request.offset, request.limit)
                .map(|v| v.to_record())
                .collect(),
            None => Vec::new(),
        };
        Ok(records)
    }

    fn current_tx(&self) -> TxId {
        TxId::new(self.tx.load(Ordering::Acquire))
    }
}
