//! The gallery index: one JSON array of photo records under a fixed key.

use super::{KeyValueStore, StorageError, StorageResult};
use crate::photo::Photo;
use std::sync::Arc;

/// Persists the ordered list of photo records.
///
/// The whole list is written as one value; the last write wins.
pub struct IndexStore {
    table: Arc<dyn KeyValueStore>,
    key: String,
}

impl IndexStore {
    pub fn new(table: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            table,
            key: key.into(),
        }
    }

    /// Key the index lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the index. An absent or empty value is an empty index; a present
    /// value that does not parse is a serialization error.
    pub async fn load(&self) -> StorageResult<Vec<Photo>> {
        let Some(json) = self.table.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json).map_err(|e| {
            StorageError::Serialization(format!("Malformed photo index '{}': {}", self.key, e))
        })
    }

    /// Replace the stored index with `photos`.
    pub async fn save(&self, photos: &[Photo]) -> StorageResult<()> {
        let json = serde_json::to_string(photos)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.table.set(&self.key, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use chrono::{TimeZone, Utc};
    use pollster::block_on;

    fn index() -> (Arc<MemoryKeyValueStore>, IndexStore) {
        let table = Arc::new(MemoryKeyValueStore::new());
        (table.clone(), IndexStore::new(table, "photos"))
    }

    fn photo(id: &str) -> Photo {
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Photo::new(id, format!("local://photo_{}.jpeg", id), created)
    }

    #[test]
    fn test_absent_index_is_empty() {
        let (table, index) = index();
        assert!(block_on(index.load()).unwrap().is_empty());

        block_on(table.set("photos", "")).unwrap();
        assert!(block_on(index.load()).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_order() {
        let (_, index) = index();
        let mut first = photo("2");
        first.title = "Sunset".to_string();
        let photos = vec![first, photo("1")];

        block_on(index.save(&photos)).unwrap();
        assert_eq!(block_on(index.load()).unwrap(), photos);
    }

    #[test]
    fn test_save_omits_webview_path() {
        let (table, index) = index();
        block_on(index.save(&[photo("1").with_webview_path("data:image/jpeg;base64,AA==")])).unwrap();

        let raw = block_on(table.get("photos")).unwrap().unwrap();
        assert!(!raw.contains("webviewPath"));
    }

    #[test]
    fn test_malformed_index_is_error() {
        let (table, index) = index();
        block_on(table.set("photos", "{\"not\": \"a list\"}")).unwrap();
        assert!(matches!(block_on(index.load()), Err(StorageError::Serialization(_))));
    }
}
