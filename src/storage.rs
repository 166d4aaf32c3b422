//! Persistent key/value storage for client-side state that has to survive
//! restarts (selected channel, last search results).

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::util::temp_path;

/// Prefix of every key the crate writes.
pub const KEY_PREFIX: &str = "streamline_";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    #[error("serde_json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

/// String key/value store with the semantics of browser storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Vec<String>;
}

/// Reads a JSON value. Missing and unreadable entries both come back as
/// `None`.
pub fn load<V: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<V> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", key, e);
            None
        }
    }
}

pub fn store<V: Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &V,
) -> Result<(), StorageError> {
    storage.set(key, &serde_json::to_string(value)?)
}

/// Removes every key starting with `prefix`, returning how many were removed.
pub fn remove_prefixed(storage: &dyn Storage, prefix: &str) -> Result<usize, StorageError> {
    let keys: Vec<String> = storage
        .keys()
        .into_iter()
        .filter(|k| k.starts_with(prefix))
        .collect();
    for key in &keys {
        storage.remove(key)?;
    }
    Ok(keys.len())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.entries).keys().cloned().collect()
    }
}

/// Storage kept as a single JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`, starting empty when the file does not exist yet. A file
    /// that cannot be parsed is ignored and overwritten on the next change.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding unreadable state file {:?}: {}", path, e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} stored entries from {:?}", entries.len(), path);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = temp_path(&self.path);
        fs::write(&temp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.entries).keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remove_prefixed_keeps_foreign_keys() {
        let storage = MemoryStorage::new();
        storage.set("streamline_selected_channel", "{}").unwrap();
        storage.set("streamline_niche_query", "\"cooking\"").unwrap();
        storage.set("google_redirect_next", "/app").unwrap();

        assert_eq!(remove_prefixed(&storage, KEY_PREFIX).unwrap(), 2);
        assert_eq!(storage.keys(), vec!["google_redirect_next".to_string()]);
    }

    #[test]
    fn unreadable_values_load_as_none() {
        let storage = MemoryStorage::new();
        storage.set("streamline_selected_channel", "{not json").unwrap();
        assert_eq!(
            load::<serde_json::Value>(&storage, "streamline_selected_channel"),
            None
        );
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let storage = FileStorage::open(&path).unwrap();
        store(&storage, "streamline_selected_channel", &json!({"channelId": "abc"})).unwrap();
        storage.set("streamline_niche_query", "\"cooking\"").unwrap();
        storage.remove("streamline_niche_query").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.keys(), vec!["streamline_selected_channel".to_string()]);
        let selected: serde_json::Value =
            load(&reopened, "streamline_selected_channel").unwrap();
        assert_eq!(selected["channelId"], "abc");
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "garbage").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.keys().is_empty());
        storage.set("streamline_x", "1").unwrap();
        assert!(!temp_path(&path).exists());
        assert_eq!(FileStorage::open(&path).unwrap().get("streamline_x").as_deref(), Some("1"));
    }
}
