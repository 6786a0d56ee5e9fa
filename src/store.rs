//! Key-value persistence port
//!
//! The lifecycle engine persists whole serialized collections under
//! well-known keys. The backing store is pluggable: an in-memory map
//! for tests and a JSON-file-per-key store for the CLI. Read or parse
//! failures degrade to "no data" with a warning; they are never
//! surfaced as hard errors.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Collection of the user's own strategies
pub const SAVED_STRATEGIES_KEY: &str = "savedStrategies";
/// Marketplace feed of published strategies
pub const PUBLISHED_STRATEGIES_KEY: &str = "publishedStrategies";

/// Per-wallet profile key
pub fn profile_key(wallet_address: &str) -> String {
    format!("userProfile_{wallet_address}")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Minimal key-value contract consumed by the lifecycle engine
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Read a JSON document, degrading to `None` on any failure
pub fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(key, error = %e, "storage read failed, treating as empty");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stored document failed to parse, treating as empty");
            None
        }
    }
}

/// Serialize and write a JSON document
pub fn write_json<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-memory store used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().expect("kv store mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().expect("kv store mutex poisoned");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one JSON document per key under a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are internal identifiers, but sanitize anyway so a
        // wallet address can never escape the data directory.
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryKvStore::new();
        assert!(store.get("missing").unwrap().is_none());
        store.set("savedStrategies", "[]").unwrap();
        assert_eq!(store.get("savedStrategies").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_read_json_degrades_on_corrupt_document() {
        let store = MemoryKvStore::new();
        store.set("savedStrategies", "{not json").unwrap();
        let parsed: Option<Vec<u32>> = read_json(&store, "savedStrategies");
        assert!(parsed.is_none());
    }

    #[test]
    fn test_write_then_read_json() {
        let store = MemoryKvStore::new();
        write_json(&store, "numbers", &vec![1u32, 2, 3]).unwrap();
        let back: Option<Vec<u32>> = read_json(&store, "numbers");
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("strategy-forge-test-{}", uuid::Uuid::new_v4()));
        let store = JsonFileStore::new(&dir);
        assert!(store.get("savedStrategies").unwrap().is_none());
        store.set("savedStrategies", "[]").unwrap();
        assert_eq!(store.get("savedStrategies").unwrap().as_deref(), Some("[]"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_profile_key_format() {
        assert_eq!(profile_key("0xabc"), "userProfile_0xabc");
    }
}
