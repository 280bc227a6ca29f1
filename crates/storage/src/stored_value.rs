//! Per-key revision storage
//!
//! Every write to a key appends a [`StoredValue`] to that key's
//! [`VersionChain`]. Chains are kept oldest-first, which is the order
//! history queries return them in; the latest revision is the tail.

use auditkv_core::{HistoryRecord, TxId};

/// One revision of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    value: Vec<u8>,
    revision: u64,
    tx_id: TxId,
}

impl StoredValue {
    /// Create a stored revision
    pub fn new(value: Vec<u8>, revision: u64, tx_id: TxId) -> Self {
        Self {
            value,
            revision,
            tx_id,
        }
    }

    /// Value bytes
    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Per-key revision number (1-based)
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Transaction that wrote this revision
    #[inline]
    pub fn tx_id(&self) -> TxId {
        self.tx_id
    }

    /// Contract form returned by history queries
    pub fn to_record(&self) -> HistoryRecord {
        HistoryRecord {
            entry: self.value.clone(),
            revision: self.revision,
            tx_id: self.tx_id,
        }
    }
}

/// All revisions of one key, oldest first. Never empty.
#[derive(Debug, Clone)]
pub struct VersionChain {
    versions: Vec<StoredValue>,
}

impl VersionChain {
    /// Start a chain with the first revision of a key
    pub fn new(value: Vec<u8>, tx_id: TxId) -> Self {
        Self {
            versions: vec![StoredValue::new(value, 1, tx_id)],
        }
    }

    /// Append a new revision written by `tx_id`.
    ///
    /// `tx_id` must be newer than every revision already in the chain.
    pub fn push(&mut self, value: Vec<u8>, tx_id: TxId) {
        debug_assert!(
            self.latest().tx_id() < tx_id,
            "revisions must be appended in transaction order"
        );
        let revision = self.latest().revision() + 1;
        self.versions.push(StoredValue::new(value, revision, tx_id));
    }

    /// Most recent revision
    #[inline]
    pub fn latest(&self) -> &StoredValue {
        // Chains are created with one revision and never shrink.
        &self.versions[self.versions.len() - 1]
    }

    /// Revisions oldest first, skipping `offset`, at most `limit`
    pub fn history(&self, offset: u64, limit: usize) -> impl Iterator<Item = &StoredValue> {
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        self.versions.iter().skip(skip).take(limit)
    }

    /// Number of revisions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
