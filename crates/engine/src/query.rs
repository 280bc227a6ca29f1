//! Read path
//!
//! A query is a prefix condition on one indexed field. The index is scanned
//! under `<collection>.<field>.{<condition>` page by page, each index entry
//! is dereferenced to its payload with a point read, and documents are
//! returned in index key order.
//!
//! Pages are separate substrate reads. A write that commits between two
//! pages may or may not show up in the result.

use tracing::debug;

use auditkv_core::{validate_field_name, Error, KeyValue, Result, ScanRequest};

use crate::engine::Collection;

/// One page of query results
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Documents in index key order
    pub documents: Vec<Vec<u8>>,
    /// Resume point for the next page; `None` once the scan is exhausted
    pub cursor: Option<Vec<u8>>,
}

impl Page {
    /// True when no further page should be requested
    pub fn is_last(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Reads documents from one collection through its indexes
#[derive(Debug, Clone, Copy)]
pub struct Query<'a> {
    collection: &'a Collection,
    page_size: usize,
}

impl<'a> Query<'a> {
    pub(crate) fn new(collection: &'a Collection) -> Self {
        Self {
            collection,
            page_size: collection.query_config().scan_page_size,
        }
    }

    /// Override the scan page size for this query
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// All documents whose `field` value starts with `condition`.
    ///
    /// `field` is the primary key specification (e.g. `a+b`) or a
    /// secondary field. An empty condition matches every document.
    ///
    /// # Errors
    ///
    /// `ScanFailed`, `DereferenceFailed`, or `DanglingIndex`; no retries.
    pub fn read(&self, field: &str, condition: &str) -> Result<Vec<Vec<u8>>> {
        let mut documents = Vec::new();
        let mut cursor: Option<Vec<u8>> = None;
        let mut pages = 0usize;

        loop {
            let page = self.read_page(field, condition, cursor.as_deref())?;
            pages += 1;
            documents.extend(page.documents);
            match page.cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(
            target: "auditkv::query",
            collection = self.collection.name(),
            field,
            condition,
            pages,
            documents = documents.len(),
            "Read complete"
        );
        Ok(documents)
    }

    /// One page of documents after `cursor` (exclusive).
    ///
    /// Pass `None` to start, then the returned cursor until it is `None`.
    pub fn read_page(&self, field: &str, condition: &str, cursor: Option<&[u8]>) -> Result<Page> {
        // A composite primary spec is queryable by its `+` name.
        if field != self.collection.schema().primary().name() {
            validate_field_name(field)?;
        }
        let prefix = self.collection.encoder()?.scan_prefix(field, condition);

        let mut request = ScanRequest::new(prefix.clone(), self.page_size);
        if let Some(seek) = cursor {
            request.seek_key = seek.to_vec();
        }

        let entries = self
            .collection
            .substrate()
            .scan(&request)
            .map_err(|source| Error::ScanFailed { prefix, source })?;

        let cursor = entries.last().map(|kv| kv.key.clone());
        let documents = entries
            .iter()
            .map(|entry| self.dereference(entry))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page { documents, cursor })
    }

    fn dereference(&self, entry: &KeyValue) -> Result<Vec<u8>> {
        let payload_key = String::from_utf8_lossy(&entry.value).into_owned();
        let document = self
            .collection
            .substrate()
            .get(&entry.value)
            .map_err(|source| Error::DereferenceFailed {
                key: payload_key.clone(),
                source,
            })?;
        document.ok_or_else(|| Error::DanglingIndex {
            index_key: entry.key_str(),
            payload_key,
        })
    }
}
