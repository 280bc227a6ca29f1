//! Collection schema store
//!
//! A collection's configuration lives in two control keys:
//!
//! - `_collection.{<name>}.indexes`: JSON array of field paths, primary
//!   key specification first
//! - `_collection.{<name>}.settings`: JSON object `{"kind", "parser"}`
//!
//! Both are written in one transaction. Reading a collection that was
//! created before settings existed falls back to the default settings.

use std::sync::Arc;

use tracing::{info, warn};

use auditkv_core::key::{
    collection_from_control_key, control_key, control_prefix, CONTROL_INDEXES, CONTROL_SETTINGS,
};
use auditkv_core::{
    validate_collection_name, CollectionSettings, Error, KeyValue, Result, ScanRequest, Schema,
    Substrate, TxId,
};

/// A collection as persisted in the control keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCollection {
    /// Collection name
    pub name: String,
    /// Indexed fields
    pub schema: Schema,
    /// Repository and parser settings
    pub settings: CollectionSettings,
}

/// Reads and writes collection control keys
#[derive(Clone)]
pub struct SchemaStore {
    substrate: Arc<dyn Substrate>,
    scan_page_size: usize,
}

impl SchemaStore {
    /// Schema store over `substrate`, listing in pages of `scan_page_size`
    pub fn new(substrate: Arc<dyn Substrate>, scan_page_size: usize) -> Self {
        Self {
            substrate,
            scan_page_size: scan_page_size.max(1),
        }
    }

    /// Create or redefine a collection.
    ///
    /// Redefining keeps every document already written under the old
    /// schema, but those index entries are no longer reachable through the
    /// new field list.
    pub fn create(
        &self,
        name: &str,
        schema: &Schema,
        settings: CollectionSettings,
    ) -> Result<TxId> {
        validate_collection_name(name)?;
        if self.exists(name)? {
            warn!(
                target: "auditkv::schema",
                collection = name,
                "Overwriting existing collection definition"
            );
        }
        self.write(name, schema, settings)
    }

    /// Create a collection that must not exist yet.
    ///
    /// # Errors
    ///
    /// `Error::AlreadyExists` if the collection is configured.
    pub fn create_new(
        &self,
        name: &str,
        schema: &Schema,
        settings: CollectionSettings,
    ) -> Result<TxId> {
        validate_collection_name(name)?;
        if self.exists(name)? {
            return Err(Error::AlreadyExists {
                collection: name.to_string(),
            });
        }
        self.write(name, schema, settings)
    }

    fn write(&self, name: &str, schema: &Schema, settings: CollectionSettings) -> Result<TxId> {
        let indexes = serde_json::to_vec(&schema.fields())
            .map_err(|e| Error::InvalidSchema(e.to_string()))?;
        let settings_blob =
            serde_json::to_vec(&settings).map_err(|e| Error::InvalidSchema(e.to_string()))?;

        let tx_id = self
            .substrate
            .set_all(vec![
                KeyValue::new(control_key(name, CONTROL_INDEXES), indexes),
                KeyValue::new(control_key(name, CONTROL_SETTINGS), settings_blob),
            ])
            .map_err(|source| Error::SchemaWriteFailed {
                collection: name.to_string(),
                source,
            })?;

        info!(
            target: "auditkv::schema",
            collection = name,
            indexes = ?schema.fields(),
            parser = %settings.parser,
            tx_id = tx_id.as_u64(),
            "Created collection"
        );
        Ok(tx_id)
    }

    /// Whether `name` has an index list stored
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_control(name, CONTROL_INDEXES)?.is_some())
    }

    fn get_control(&self, name: &str, item: &str) -> Result<Option<Vec<u8>>> {
        self.substrate
            .get(control_key(name, item).as_bytes())
            .map_err(|source| Error::SchemaReadFailed {
                collection: name.to_string(),
                source,
            })
    }

    /// Read a collection's schema and settings.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` if the collection was never created
    /// - `SchemaRequired` if the stored field list is empty
    /// - `CorruptSchema` if a blob cannot be decoded
    pub fn read(&self, name: &str) -> Result<StoredCollection> {
        validate_collection_name(name)?;

        let blob = self
            .get_control(name, CONTROL_INDEXES)?
            .ok_or_else(|| Error::NotConfigured {
                collection: name.to_string(),
            })?;
        let fields: Vec<String> =
            serde_json::from_slice(&blob).map_err(|e| Error::CorruptSchema {
                collection: name.to_string(),
                reason: e.to_string(),
            })?;
        if fields.is_empty() {
            return Err(Error::SchemaRequired {
                collection: name.to_string(),
            });
        }
        let schema = Schema::new(&fields).map_err(|e| Error::CorruptSchema {
            collection: name.to_string(),
            reason: e.to_string(),
        })?;

        let settings = match self.get_control(name, CONTROL_SETTINGS)? {
            Some(blob) => serde_json::from_slice(&blob).map_err(|e| Error::CorruptSchema {
                collection: name.to_string(),
                reason: format!("settings: {}", e),
            })?,
            None => CollectionSettings::default(),
        };

        Ok(StoredCollection {
            name: name.to_string(),
            schema,
            settings,
        })
    }

    /// Names of all configured collections, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let prefix = control_prefix();
        let mut names = Vec::new();
        let mut request = ScanRequest::new(prefix.clone(), self.scan_page_size);

        loop {
            let page = self
                .substrate
                .scan(&request)
                .map_err(|source| Error::ScanFailed {
                    prefix: prefix.clone(),
                    source,
                })?;
            let Some(last) = page.last() else {
                break;
            };
            request.seek_key = last.key.clone();

            for entry in &page {
                let key = entry.key_str();
                if let Some(name) = collection_from_control_key(&key, CONTROL_INDEXES) {
                    names.push(name.to_string());
                }
            }
        }

        Ok(names)
    }
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore")
            .field("scan_page_size", &self.scan_page_size)
            .finish_non_exhaustive()
    }
}
