//! In-memory storage implementations.

use super::{BlobStore, KeyValueStore, StorageError, StorageRef, StorageResult};
use crate::BoxFuture;
use crate::image::EncodedImage;
use std::collections::BTreeMap;
use std::sync::RwLock;

const MEMORY_REF_SCHEME: &str = "memory://";

/// In-memory blob store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, EncodedImage>>,
}

impl MemoryBlobStore {
    /// Create a new empty memory blob store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key_of(reference: &StorageRef) -> &str {
        reference
            .as_str()
            .strip_prefix(MEMORY_REF_SCHEME)
            .unwrap_or(reference.as_str())
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl BlobStore for MemoryBlobStore {
    fn write(&self, key: &str, image: &EncodedImage) -> BoxFuture<'_, StorageResult<StorageRef>> {
        let key = key.to_string();
        let image = image.clone();
        Box::pin(async move {
            let mut blobs = self.blobs.write().map_err(lock_error)?;
            let reference = StorageRef::new(format!("{}{}", MEMORY_REF_SCHEME, key));
            blobs.insert(key, image);
            Ok(reference)
        })
    }

    fn read(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<EncodedImage>> {
        let key = Self::key_of(reference).to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(lock_error)?;
            blobs.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn delete(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<()>> {
        let key = Self::key_of(reference).to_string();
        Box::pin(async move {
            let mut blobs = self.blobs.write().map_err(lock_error)?;
            blobs
                .remove(&key)
                .map(|_| ())
                .ok_or(StorageError::NotFound(key))
        })
    }

    fn exists(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<bool>> {
        let key = Self::key_of(reference).to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(lock_error)?;
            Ok(blobs.contains_key(&key))
        })
    }

    fn to_renderable(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<String>> {
        let key = Self::key_of(reference).to_string();
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(lock_error)?;
            blobs
                .get(&key)
                .map(EncodedImage::to_data_url)
                .ok_or(StorageError::NotFound(key))
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<StorageRef>>> {
        Box::pin(async move {
            let blobs = self.blobs.read().map_err(lock_error)?;
            Ok(blobs
                .keys()
                .map(|k| StorageRef::new(format!("{}{}", MEMORY_REF_SCHEME, k)))
                .collect())
        })
    }
}

/// In-memory key/value table for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
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
            entries.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(lock_error)?;
            entries.remove(&key);
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
    use crate::image::ImageFormat;
    use pollster::block_on;

    fn sample() -> EncodedImage {
        EncodedImage::new(ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    #[test]
    fn test_write_and_read() {
        let store = MemoryBlobStore::new();
        let reference = block_on(store.write("photo_1.jpeg", &sample())).unwrap();

        assert_eq!(reference.as_str(), "memory://photo_1.jpeg");
        assert_eq!(block_on(store.read(&reference)).unwrap(), sample());
        assert!(block_on(store.exists(&reference)).unwrap());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = MemoryBlobStore::new();
        let reference = block_on(store.write("photo_1.jpeg", &sample())).unwrap();

        block_on(store.delete(&reference)).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            block_on(store.delete(&reference)),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_renderable_is_data_url() {
        let store = MemoryBlobStore::new();
        let reference = block_on(store.write("photo_1.jpeg", &sample())).unwrap();
        let uri = block_on(store.to_renderable(&reference)).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_key_value_roundtrip() {
        let table = MemoryKeyValueStore::new();
        assert_eq!(block_on(table.get("photos")).unwrap(), None);

        block_on(table.set("photos", "[]")).unwrap();
        assert_eq!(block_on(table.get("photos")).unwrap().as_deref(), Some("[]"));
        assert_eq!(block_on(table.keys()).unwrap(), vec!["photos".to_string()]);

        block_on(table.remove("photos")).unwrap();
        block_on(table.remove("photos")).unwrap();
        assert_eq!(block_on(table.get("photos")).unwrap(), None);
    }
}
