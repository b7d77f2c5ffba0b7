//! Key-value persistence for scores, ratings and settings
//!
//! Features:
//! - String keys and values, the same shape as browser LocalStorage
//! - In-memory store for tests and headless runs
//! - JSON file store with atomic replace (tmp → rename)
//! - LocalStorage store on wasm32

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// A get/set string store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Volatile store backed by a HashMap
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A JSON object on disk, rewritten in full on every `set`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json = fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&json)?
            }
        } else {
            BTreeMap::new()
        };
        log::info!("Opened store {} ({} keys)", path.display(), values.len());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let previous = self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            // Keep memory and disk in agreement
            match previous {
                Some(v) => self.values.insert(key.to_string(), v),
                None => self.values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    /// `None` when the page has no window or storage is disabled
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()?;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("k", "v").unwrap();
        store.set("k", "w").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("w"));
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("highScore", "42").unwrap();
        store.set("visits", "3").unwrap();
        assert!(!path.with_extension("tmp").exists());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("highScore").unwrap().as_deref(), Some("42"));
        assert_eq!(reopened.get("visits").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_file_store_empty_file_is_empty_store() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = JsonFileStore::open(file.path()).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_file_store_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so the flush fails
        let path = dir.path().join("missing").join("store.json");
        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(matches!(store.set("k", "v"), Err(StoreError::Io(_))));
        assert_eq!(store.get("k").unwrap(), None);
    }
}
