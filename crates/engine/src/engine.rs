//! Engine entry point and collection handles
//!
//! `Engine::open` resolves the substrate once from [`EngineConfig`]. Every
//! collection opened through it shares that substrate but carries its own
//! immutable schema, so any number of collections can be used from any
//! number of threads at the same time.

use std::sync::Arc;

use tracing::info;

use auditkv_core::{CollectionSettings, Error, KeyEncoder, Result, Schema, Substrate, TxId};
use auditkv_storage::{StoreOptions, VersionedStore};

use crate::config::{EngineConfig, IngestConfig, QueryConfig, StorageMode};
use crate::history::History;
use crate::indexer::Indexer;
use crate::query::Query;
use crate::schema_store::{SchemaStore, StoredCollection};

/// Open substrate plus configuration
#[derive(Clone)]
pub struct Engine {
    substrate: Arc<dyn Substrate>,
    config: EngineConfig,
}

impl Engine {
    /// Open the substrate described by `config`.
    ///
    /// # Errors
    ///
    /// `Error::Config` for invalid paging values, `Error::StorageOpen` if
    /// the durable store cannot be opened or replayed.
    pub fn open(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let substrate: Arc<dyn Substrate> = match config.storage.mode {
            StorageMode::Memory => Arc::new(VersionedStore::new()),
            StorageMode::Durable => {
                let options = StoreOptions {
                    sync_on_commit: config.storage.sync_on_commit,
                };
                let store = VersionedStore::open(&config.storage.data_dir, options)
                    .map_err(Error::StorageOpen)?;
                Arc::new(store)
            }
        };

        info!(
            target: "auditkv::engine",
            mode = ?config.storage.mode,
            tx_id = substrate.current_tx().as_u64(),
            "Engine opened"
        );

        Ok(Self { substrate, config })
    }

    /// Engine over an existing substrate, for callers that bring their own
    pub fn with_substrate(substrate: Arc<dyn Substrate>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { substrate, config })
    }

    /// In-memory engine with default configuration
    pub fn memory() -> Self {
        Self {
            substrate: Arc::new(VersionedStore::new()),
            config: EngineConfig::memory(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared substrate handle
    pub fn substrate(&self) -> &Arc<dyn Substrate> {
        &self.substrate
    }

    /// Schema store over this engine's substrate
    pub fn schema_store(&self) -> SchemaStore {
        SchemaStore::new(self.substrate.clone(), self.config.query.scan_page_size)
    }

    /// Create or redefine a collection (see [`SchemaStore::create`])
    pub fn create_collection(
        &self,
        name: &str,
        schema: &Schema,
        settings: CollectionSettings,
    ) -> Result<TxId> {
        self.schema_store().create(name, schema, settings)
    }

    /// Create a collection that must not exist yet
    pub fn create_new_collection(
        &self,
        name: &str,
        schema: &Schema,
        settings: CollectionSettings,
    ) -> Result<TxId> {
        self.schema_store().create_new(name, schema, settings)
    }

    /// Load a collection's schema and return a handle for it.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`SchemaStore::read`].
    pub fn open_collection(&self, name: &str) -> Result<Collection> {
        let stored = self.schema_store().read(name)?;
        Ok(Collection::from_stored(
            stored,
            self.substrate.clone(),
            self.config.query,
        ))
    }

    /// Names of all configured collections
    pub fn list_collections(&self) -> Result<Vec<String>> {
        self.schema_store().list()
    }

    /// Ingestion settings
    pub fn ingest_config(&self) -> IngestConfig {
        self.config.ingest
    }

    /// Highest committed transaction
    pub fn current_tx(&self) -> TxId {
        self.substrate.current_tx()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Immutable handle on one configured collection.
///
/// Cheap to clone. Hands out the write, read, and history paths.
#[derive(Clone)]
pub struct Collection {
    name: Arc<str>,
    schema: Arc<Schema>,
    settings: CollectionSettings,
    substrate: Arc<dyn Substrate>,
    query: QueryConfig,
}

impl Collection {
    fn from_stored(
        stored: StoredCollection,
        substrate: Arc<dyn Substrate>,
        query: QueryConfig,
    ) -> Self {
        Self {
            name: Arc::from(stored.name),
            schema: Arc::new(stored.schema),
            settings: stored.settings,
            substrate,
            query,
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexed fields
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Repository and parser settings
    pub fn settings(&self) -> CollectionSettings {
        self.settings
    }

    /// Paging configuration
    pub fn query_config(&self) -> QueryConfig {
        self.query
    }

    pub(crate) fn substrate(&self) -> &dyn Substrate {
        self.substrate.as_ref()
    }

    /// Key encoder bound to this collection
    pub fn encoder(&self) -> Result<KeyEncoder<'_>> {
        KeyEncoder::new(&self.name, &self.schema)
    }

    /// Write path
    pub fn indexer(&self) -> Indexer<'_> {
        Indexer::new(self)
    }

    /// Read path
    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }

    /// History path
    pub fn history(&self) -> History<'_> {
        History::new(self)
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
