//! History path
//!
//! A document's revisions all live under its payload key, so history is a
//! paged substrate history fetch on one key. No scan is involved.

use tracing::debug;

use auditkv_core::{Error, HistoryRecord, HistoryRequest, Result};

use crate::engine::Collection;

/// Revision history reader for one collection
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    collection: &'a Collection,
    page_size: usize,
}

impl<'a> History<'a> {
    pub(crate) fn new(collection: &'a Collection) -> Self {
        Self {
            collection,
            page_size: collection.query_config().history_page_size,
        }
    }

    /// Override the history page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every revision of the document with primary key value `pk`, oldest
    /// first.
    ///
    /// A document that was never written has an empty history.
    ///
    /// # Errors
    ///
    /// `HistoryFailed` wrapping the substrate error.
    pub fn history(&self, pk: &str) -> Result<Vec<HistoryRecord>> {
        let key = self.collection.encoder()?.payload_key(pk);
        let mut records = Vec::new();
        let mut offset = 0u64;

        loop {
            let request = HistoryRequest {
                key: key.clone().into_bytes(),
                offset,
                limit: self.page_size,
            };
            let page = self
                .collection
                .substrate()
                .history(&request)
                .map_err(|source| Error::HistoryFailed {
                    key: key.clone(),
                    source,
                })?;

            let len = page.len();
            records.extend(page);
            if len < self.page_size {
                break;
            }
            offset += len as u64;
        }

        debug!(
            target: "auditkv::history",
            collection = self.collection.name(),
            key = %key,
            revisions = records.len(),
            "History fetched"
        );
        Ok(records)
    }
}
