//! Keyed JSON storage for player saves.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use engine_core::{GameError, GameResult, GameSave};
use serde_json::Value;

/// An opaque get/put store of JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> GameResult<Option<Value>>;
    fn put(&self, key: &str, value: Value) -> GameResult<()>;
}

/// In-process store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> GameResult<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| GameError::Persistence("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> GameResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GameError::Persistence("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// One pretty-printed `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open a store, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> GameResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| GameError::Persistence(format!("create {}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys map to file names one-to-one: every byte outside `[A-Za-z0-9-]`
    /// is written as `%XX`.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file = String::with_capacity(key.len());
        for b in key.bytes() {
            if b.is_ascii_alphanumeric() || b == b'-' {
                file.push(b as char);
            } else {
                file.push_str(&format!("%{:02X}", b));
            }
        }
        self.root.join(format!("{}.json", file))
    }
}

impl KeyValueStore for DirectoryStore {
    fn get(&self, key: &str) -> GameResult<Option<Value>> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(GameError::Persistence(format!("read {}: {}", path.display(), e)))
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| GameError::Serialization(format!("{}: {}", path.display(), e)))
    }

    fn put(&self, key: &str, value: Value) -> GameResult<()> {
        let path = self.path_for(key);
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| GameError::Serialization(e.to_string()))?;
        fs::write(&path, text)
            .map_err(|e| GameError::Persistence(format!("write {}: {}", path.display(), e)))
    }
}

/// Reads and writes [`GameSave`]s under `game:<userId>`.
#[derive(Clone)]
pub struct SaveRepository {
    store: Arc<dyn KeyValueStore>,
}

impl SaveRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn key(user_id: &str) -> String {
        format!("game:{}", user_id)
    }

    pub fn load(&self, user_id: &str) -> GameResult<Option<GameSave>> {
        let Some(value) = self.store.get(&Self::key(user_id))? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| GameError::Serialization(format!("save for {}: {}", user_id, e)))
    }

    pub fn store(&self, save: &GameSave) -> GameResult<()> {
        let value =
            serde_json::to_value(save).map_err(|e| GameError::Serialization(e.to_string()))?;
        self.store.put(&Self::key(&save.user_id), value).map_err(|e| {
            log::error!("Failed to persist save for {}: {}", save.user_id, e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::tests::test_planet;

    #[test]
    fn repository_round_trip_in_memory() {
        let store = Arc::new(MemoryStore::new());
        let repo = SaveRepository::new(store.clone());
        assert!(repo.load("alice").unwrap().is_none());

        let save = GameSave::new("alice", vec![test_planet(4)], 123);
        repo.store(&save).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("game:alice").unwrap().is_some());
        assert_eq!(repo.load("alice").unwrap(), Some(save));
    }

    #[test]
    fn malformed_save_is_a_serialization_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .put("game:bob", serde_json::json!({ "userId": 5 }))
            .unwrap();
        let repo = SaveRepository::new(store);
        assert!(matches!(repo.load("bob"), Err(GameError::Serialization(_))));
    }

    #[test]
    fn directory_store_writes_one_file_per_key() {
        let root = std::env::temp_dir().join(format!("galaxy-store-{}", uuid::Uuid::new_v4()));
        let store = DirectoryStore::open(&root).unwrap();
        assert_eq!(store.get("game:alice").unwrap(), None);

        store
            .put("game:alice", serde_json::json!({ "lastSaveTime": 7 }))
            .unwrap();
        assert!(root.join("game%3Aalice.json").exists());
        assert_eq!(
            store.get("game:alice").unwrap(),
            Some(serde_json::json!({ "lastSaveTime": 7 }))
        );

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn similar_keys_get_separate_files() {
        let root = std::env::temp_dir().join(format!("galaxy-store-{}", uuid::Uuid::new_v4()));
        let store = DirectoryStore::open(&root).unwrap();
        let keys = ["game:a.b", "game:a_b", "game:a:b", "game_a_b", "game:é"];
        for (i, key) in keys.iter().enumerate() {
            store.put(key, serde_json::json!({ "n": i })).unwrap();
        }

        let mut paths: Vec<PathBuf> = keys.iter().map(|k| store.path_for(k)).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), keys.len());
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(store.get(key).unwrap(), Some(serde_json::json!({ "n": i })));
        }

        fs::remove_dir_all(&root).unwrap();
    }
}
