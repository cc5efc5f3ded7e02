//! # Persisted State
//!
//! A small key/value store for the two values that survive restarts:
//!
//! | key             | value                         |
//! |-----------------|-------------------------------|
//! | `app_mode`      | `dev` or `production`         |
//! | `gps_dev_token` | last token entered in dev mode |
//!
//! [`FileStorage`] keeps a JSON object on disk under the platform data
//! directory. [`MemoryStorage`] is used when nothing should touch disk.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::core::error::StorageError;

pub const MODE_KEY: &str = "app_mode";
pub const DEV_TOKEN_KEY: &str = "gps_dev_token";

const APP_DIR: &str = "gps-dashboard";
const STORAGE_FILE: &str = "storage.json";

/// Key/value persistence used by the mode controller.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// JSON file storage. Every write rewrites the whole file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the store at `path`. A missing file starts empty; a file that is
    /// not a JSON object of strings is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Ignoring unreadable storage file"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_error(&path, e)),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Storage opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// `<data dir>/gps-dashboard/storage.json`, if the platform has a data dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
            }
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Encode(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(MODE_KEY), None);
        storage.set(MODE_KEY, "dev").expect("set");
        assert_eq!(storage.get(MODE_KEY).as_deref(), Some("dev"));
        storage.remove(MODE_KEY).expect("remove");
        assert_eq!(storage.get(MODE_KEY), None);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        // Arrange
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("storage.json");

        // Act
        {
            let storage = FileStorage::open(&path).expect("open");
            storage.set(MODE_KEY, "production").expect("set mode");
            storage.set(DEV_TOKEN_KEY, "abc123").expect("set token");
        }
        let reopened = FileStorage::open(&path).expect("reopen");

        // Assert
        assert_eq!(reopened.get(MODE_KEY).as_deref(), Some("production"));
        assert_eq!(reopened.get(DEV_TOKEN_KEY).as_deref(), Some("abc123"));
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_file_storage_remove_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");
        let storage = FileStorage::open(&path).expect("open");
        storage.set(DEV_TOKEN_KEY, "abc123").expect("set");
        storage.remove(DEV_TOKEN_KEY).expect("remove");

        let reopened = FileStorage::open(&path).expect("reopen");
        assert_eq!(reopened.get(DEV_TOKEN_KEY), None);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").expect("write");

        let storage = FileStorage::open(&path).expect("open");
        assert_eq!(storage.get(MODE_KEY), None);
        storage.set(MODE_KEY, "dev").expect("overwrite");
        assert_eq!(FileStorage::open(&path).expect("reopen").get(MODE_KEY).as_deref(), Some("dev"));
    }
}
