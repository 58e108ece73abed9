//! Native preference store: a string map persisted as one JSON file.

use super::{KeyValueStore, StorageError, StorageResult};
use crate::BoxFuture;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Key/value preferences backed by a JSON file.
///
/// Entries are cached in memory; every mutation rewrites the file through a
/// temporary sibling and a rename, so readers see either the old or the new
/// map.
pub struct FilePreferences {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Open the preference file at `path`, creating parent directories.
    pub fn open(path: PathBuf) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let entries = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            if json.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&json).map_err(|e| {
                    StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StorageError::Io(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl KeyValueStore for FilePreferences {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            Ok(entries.get(&key).cloned())
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(lock_error)?;
            let mut updated = entries.clone();
            updated.insert(key, value);
            self.persist(&updated)?;
            *entries = updated;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(lock_error)?;
            if !entries.contains_key(&key) {
                return Ok(());
            }
            let mut updated = entries.clone();
            updated.remove(&key);
            self.persist(&updated)?;
            *entries = updated;
            Ok(())
        })
    }

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(lock_error)?;
            Ok(entries.keys().cloned().collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;
    use tempfile::tempdir;

    #[test]
    fn test_preferences_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let prefs = FilePreferences::open(path.clone()).unwrap();
        block_on(prefs.set("photos", "[]")).unwrap();
        block_on(prefs.set("theme", "dark")).unwrap();
        drop(prefs);

        let reopened = FilePreferences::open(path).unwrap();
        assert_eq!(block_on(reopened.get("photos")).unwrap().as_deref(), Some("[]"));
        assert_eq!(block_on(reopened.keys()).unwrap(), vec!["photos", "theme"]);
    }

    #[test]
    fn test_preferences_remove() {
        let dir = tempdir().unwrap();
        let prefs = FilePreferences::open(dir.path().join("preferences.json")).unwrap();

        block_on(prefs.set("photos", "[]")).unwrap();
        block_on(prefs.remove("photos")).unwrap();
        block_on(prefs.remove("photos")).unwrap();
        assert_eq!(block_on(prefs.get("photos")).unwrap(), None);
    }

    #[test]
    fn test_preferences_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            FilePreferences::open(path),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_preferences_leave_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let prefs = FilePreferences::open(path.clone()).unwrap();

        block_on(prefs.set("photos", "[]")).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
