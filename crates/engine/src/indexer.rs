//! Write path
//!
//! One document is one transaction: its primary index entry, every
//! secondary index entry, and its payload are handed to the substrate in a
//! single `set_all`. Index entries therefore never point at a payload that
//! is not visible, and an encoding failure writes nothing.

use serde_json::Value as JsonValue;
use tracing::trace;

use auditkv_core::{EncodedKeys, Error, Result, TxId};

use crate::engine::Collection;

/// Stores documents into one collection
#[derive(Debug, Clone, Copy)]
pub struct Indexer<'a> {
    collection: &'a Collection,
}

impl<'a> Indexer<'a> {
    pub(crate) fn new(collection: &'a Collection) -> Self {
        Self { collection }
    }

    /// Store raw document bytes, which must encode a JSON object.
    ///
    /// The bytes are stored unchanged as the payload.
    ///
    /// # Errors
    ///
    /// - `InvalidDocument`, `MissingPrimaryKeyField`,
    ///   `MissingSecondaryKeyField` before anything is written
    /// - `WriteFailed` if the substrate rejects the transaction
    pub fn write(&self, document: &[u8]) -> Result<TxId> {
        let encoder = self.collection.encoder()?;
        let keys = encoder.encode(document)?;
        self.commit(keys, document.to_vec())
    }

    /// Store an already parsed document, serialized compactly.
    pub fn write_value(&self, document: &JsonValue) -> Result<TxId> {
        let encoder = self.collection.encoder()?;
        let keys = encoder.encode_value(document)?;
        let bytes =
            serde_json::to_vec(document).map_err(|e| Error::InvalidDocument(e.to_string()))?;
        self.commit(keys, bytes)
    }

    fn commit(&self, keys: EncodedKeys, document: Vec<u8>) -> Result<TxId> {
        let payload_key = keys.payload_key.clone();
        let tx_id = self
            .collection
            .substrate()
            .set_all(keys.into_entries(document))
            .map_err(Error::WriteFailed)?;

        trace!(
            target: "auditkv::indexer",
            collection = self.collection.name(),
            key = %payload_key,
            tx_id = tx_id.as_u64(),
            "Stored document"
        );
        Ok(tx_id)
    }
}
