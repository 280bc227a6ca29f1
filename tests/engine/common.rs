//! Shared test utilities for the end-to-end suite.

#![allow(dead_code)]
#![allow(unused_imports)]

use auditkv::{
    Collection, CollectionSettings, Engine, EngineConfig, ScanRequest, Schema, Substrate,
};
use serde_json::Value as JsonValue;
use tempfile::TempDir;

/// Engine plus the directory backing it, if durable
pub struct TestEngine {
    pub engine: Engine,
    pub dir: Option<TempDir>,
}

impl TestEngine {
    pub fn memory() -> Self {
        Self {
            engine: Engine::memory(),
            dir: None,
        }
    }

    pub fn durable() -> Self {
        let dir = TempDir::new().unwrap();
        let engine = Engine::open(EngineConfig::durable(dir.path())).unwrap();
        Self {
            engine,
            dir: Some(dir),
        }
    }

    /// Drop the engine and open a fresh one over the same directory.
    pub fn reopen(self) -> Self {
        let dir = self.dir.expect("reopen needs a durable engine");
        drop(self.engine);
        let engine = Engine::open(EngineConfig::durable(dir.path())).unwrap();
        Self {
            engine,
            dir: Some(dir),
        }
    }

    pub fn collection(&self, name: &str, fields: &[&str]) -> Collection {
        self.engine
            .create_collection(
                name,
                &Schema::new(fields).unwrap(),
                CollectionSettings::default(),
            )
            .unwrap();
        self.engine.open_collection(name).unwrap()
    }

    /// Number of substrate keys under `prefix`
    pub fn key_count(&self, prefix: &str) -> usize {
        self.engine
            .substrate()
            .scan(&ScanRequest::new(prefix, 1_000_000))
            .unwrap()
            .len()
    }
}

pub fn parse(bytes: &[u8]) -> JsonValue {
    serde_json::from_slice(bytes).unwrap()
}

/// Field `name` of every document, as strings
pub fn field_values(documents: &[Vec<u8>], name: &str) -> Vec<String> {
    documents
        .iter()
        .map(|d| match &parse(d)[name] {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}
