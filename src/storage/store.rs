/// Key/value stores backing character and account scoped data.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access storage file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("value for key {key:?} could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Minimal get/set/remove/clear store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Decode a stored value, treating undecodable data as missing
pub fn get_typed<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let value = store.get(key)?;
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("[Storage] Ignoring undecodable value for {:?}: {}", key, e);
            None
        }
    }
}

pub fn set_typed<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let value = serde_json::to_value(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, value)
}

/// Process-local store, lost on exit
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.write().clear();
        Ok(())
    }
}

/// Store persisted as a single pretty-printed JSON object, rewritten on every mutation
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, Value>>,
}

impl JsonFileStore {
    /// Open the store, loading existing entries if the file is present
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            let entries: HashMap<String, Value> = serde_json::from_str(&contents)
                .map_err(|source| StorageError::Corrupt {
                    path: path.clone(),
                    source,
                })?;
            info!("[Storage] Loaded {} key(s) from {:?}", entries.len(), path);
            entries
        } else {
            debug!("[Storage] {:?} does not exist yet, starting empty", path);
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy and keep it only if the file write succeeds.
    /// `change` returns whether anything changed.
    fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut HashMap<String, Value>) -> bool,
    {
        let mut entries = self.entries.write();
        let mut next = entries.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn flush(&self, entries: &HashMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Encode {
            key: String::from("*"),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.update(|next| {
            next.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|next| next.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(|next| {
            next.clear();
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_basic_ops() {
        let store = MemoryStore::new();
        assert!(store.get("a").is_none());

        store.set("a", json!(1)).unwrap();
        store.set("b", json!("two")).unwrap();
        assert_eq!(store.get("a"), Some(json!(1)));
        assert_eq!(store.len(), 2);

        store.remove("a").unwrap();
        assert!(store.get("a").is_none());

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_typed_helpers() {
        let store = MemoryStore::new();
        set_typed(&store, "ids", &vec!["x".to_string(), "y".to_string()]).unwrap();
        let ids: Vec<String> = get_typed(&store, "ids").unwrap();
        assert_eq!(ids, vec!["x", "y"]);

        // Wrong shape decodes as missing
        assert!(get_typed::<u64>(&store, "ids").is_none());
    }

    #[test]
    fn test_json_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("account.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("countEmpties", json!(20)).unwrap();
            store.set("gone", json!(true)).unwrap();
            store.remove("gone").unwrap();
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("countEmpties"), Some(json!(20)));
        assert!(store.get("gone").is_none());
    }

    #[test]
    fn test_character_switch_clears_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("character-main.json");
        let store = std::sync::Arc::new(JsonFileStore::open(&path).unwrap());
        store.set("placeholder:oak_logs", json!({"tab": 0})).unwrap();

        let storage = crate::storage::OwnerStorage::new(store.clone(), std::sync::Arc::new(MemoryStore::new()));
        storage.switch_character().unwrap();

        assert!(store.get("placeholder:oak_logs").is_none());
        assert!(JsonFileStore::open(store.path()).unwrap().get("placeholder:oak_logs").is_none());
    }

    #[test]
    fn test_json_file_store_keeps_entries_when_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("countEmpties", json!(10)).unwrap();

        // A directory in place of the file makes every write fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.set("countEmpties", json!(20)).is_err());
        assert!(store.clear().is_err());
        assert_eq!(store.get("countEmpties"), Some(json!(10)));
    }

    #[test]
    fn test_json_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("character.json");
        fs::write(&path, "{ not json").unwrap();

        match JsonFileStore::open(&path) {
            Err(StorageError::Corrupt { .. }) => {}
            other => panic!("expected corrupt error, got {:?}", other.map(|_| ())),
        }
    }
}
