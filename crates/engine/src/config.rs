//! Engine configuration via `auditkv.toml`
//!
//! A default `auditkv.toml` is written next to the data directory on first
//! use. To change settings, edit the file and restart.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use auditkv_core::{Error, Result};

/// Config file name
pub const CONFIG_FILE_NAME: &str = "auditkv.toml";

/// Default page size for index scans
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 999;

/// Default page size for history fetches
pub const DEFAULT_HISTORY_PAGE_SIZE: usize = 100;

/// Default poll interval of a following file tail
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Which substrate the engine runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Ephemeral in-memory store
    Memory,
    /// In-memory store backed by a commit log in `data_dir`
    #[default]
    Durable,
}

/// `[storage]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `"memory"` or `"durable"`
    #[serde(default)]
    pub mode: StorageMode,
    /// Directory of the commit log (durable mode only)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// fsync after every commit
    #[serde(default)]
    pub sync_on_commit: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".auditkv")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            data_dir: default_data_dir(),
            sync_on_commit: false,
        }
    }
}

/// `[query]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Index entries requested per scan page
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,
    /// Revisions requested per history page
    #[serde(default = "default_history_page_size")]
    pub history_page_size: usize,
}

fn default_scan_page_size() -> usize {
    DEFAULT_SCAN_PAGE_SIZE
}

fn default_history_page_size() -> usize {
    DEFAULT_HISTORY_PAGE_SIZE
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
        }
    }
}

/// `[ingest]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Skip documents missing indexed fields instead of aborting
    #[serde(default)]
    pub skip_invalid_documents: bool,
    /// How often a following tail checks for new lines
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            skip_invalid_documents: false,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Engine configuration loaded from `auditkv.toml`.
///
/// # Example
///
/// ```toml
/// [storage]
/// mode = "durable"
/// data_dir = ".auditkv"
///
/// [query]
/// scan_page_size = 999
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Substrate selection
    #[serde(default)]
    pub storage: StorageConfig,
    /// Read and history paging
    #[serde(default)]
    pub query: QueryConfig,
    /// Ingestion behavior
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl EngineConfig {
    /// In-memory configuration with default paging
    pub fn memory() -> Self {
        let mut config = Self::default();
        config.storage.mode = StorageMode::Memory;
        config
    }

    /// Durable configuration rooted at `dir`
    pub fn durable(dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.mode = StorageMode::Durable;
        config.storage.data_dir = dir.into();
        config
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a page size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.query.scan_page_size == 0 {
            return Err(Error::Config(
                "query.scan_page_size must be at least 1".to_string(),
            ));
        }
        if self.query.history_page_size == 0 {
            return Err(Error::Config(
                "query.history_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# auditkv configuration

[storage]
# "durable" (default) keeps a commit log in data_dir, "memory" keeps nothing
mode = "durable"
data_dir = ".auditkv"
# fsync the commit log after every document (default: false)
sync_on_commit = false

[query]
# Index entries fetched per scan page
scan_page_size = 999
# Revisions fetched per history page
history_page_size = 100

[ingest]
# Skip documents missing an indexed field instead of stopping (default: false)
skip_invalid_documents = false
# How often `tail file --follow` checks for new lines
poll_interval_ms = 250
"#
    }

    /// Parse config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "failed to create config directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
