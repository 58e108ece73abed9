//! Blob storage inside a browser-style key/value table.
//!
//! Each blob is one entry keyed `photo_<filename>` holding the JSON object
//! `{"path": <filename>, "data": <data URI>}`. References handed out are
//! `local://<filename>` tokens. Generic over the table so the same logic runs
//! against `localStorage` in the browser and an in-memory table in tests.

use super::{BlobStore, KeyValueStore, StorageError, StorageRef, StorageResult};
use crate::BoxFuture;
use crate::image::EncodedImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Scheme of the references this store hands out.
pub const LOCAL_REF_SCHEME: &str = "local://";

const BLOB_KEY_PREFIX: &str = "photo_";

/// Table key holding the blob stored as `filename`.
pub fn blob_key(filename: &str) -> String {
    format!("{}{}", BLOB_KEY_PREFIX, filename)
}

/// Value stored per blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub path: String,
    /// Data URI of the image.
    pub data: String,
}

/// Blob store over a key/value table.
pub struct LocalBlobStore<K: KeyValueStore> {
    table: Arc<K>,
}

impl<K: KeyValueStore> LocalBlobStore<K> {
    pub fn new(table: Arc<K>) -> Self {
        Self { table }
    }

    fn file_name(reference: &StorageRef) -> &str {
        reference
            .as_str()
            .strip_prefix(LOCAL_REF_SCHEME)
            .unwrap_or(reference.as_str())
    }

    async fn load_entry(&self, reference: &StorageRef) -> StorageResult<StoredBlob> {
        let file_name = Self::file_name(reference);
        let raw = self
            .table
            .get(&blob_key(file_name))
            .await?
            .ok_or_else(|| StorageError::NotFound(reference.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse blob {}: {}", file_name, e))
        })
    }
}

impl<K: KeyValueStore> BlobStore for LocalBlobStore<K> {
    fn write(&self, key: &str, image: &EncodedImage) -> BoxFuture<'_, StorageResult<StorageRef>> {
        let entry = StoredBlob {
            path: key.to_string(),
            data: image.to_data_url(),
        };
        Box::pin(async move {
            let json = serde_json::to_string(&entry)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.table.set(&blob_key(&entry.path), &json).await?;
            Ok(StorageRef::new(format!("{}{}", LOCAL_REF_SCHEME, entry.path)))
        })
    }

    fn read(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<EncodedImage>> {
        let reference = reference.clone();
        Box::pin(async move {
            let entry = self.load_entry(&reference).await?;
            EncodedImage::from_data_url(&entry.data)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", reference, e)))
        })
    }

    fn delete(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<()>> {
        let reference = reference.clone();
        Box::pin(async move {
            let key = blob_key(Self::file_name(&reference));
            if self.table.get(&key).await?.is_none() {
                return Err(StorageError::NotFound(reference.to_string()));
            }
            self.table.remove(&key).await
        })
    }

    fn exists(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<bool>> {
        let key = blob_key(Self::file_name(reference));
        Box::pin(async move { Ok(self.table.get(&key).await?.is_some()) })
    }

    fn to_renderable(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<String>> {
        let reference = reference.clone();
        Box::pin(async move { Ok(self.load_entry(&reference).await?.data) })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<StorageRef>>> {
        Box::pin(async move {
            let mut refs = Vec::new();
            for key in self.table.keys().await? {
                let Some(name) = key.strip_prefix(BLOB_KEY_PREFIX) else {
                    continue;
                };
                // The table is shared with other same-origin data.
                let Some(raw) = self.table.get(&key).await? else {
                    continue;
                };
                match serde_json::from_str::<StoredBlob>(&raw) {
                    Ok(entry) if entry.path == name => {
                        refs.push(StorageRef::new(format!("{}{}", LOCAL_REF_SCHEME, name)));
                    }
                    _ => log::debug!("Ignoring non-photo entry {}", key),
                }
            }
            Ok(refs)
        })
    }

    fn canonical(&self, reference: &StorageRef) -> StorageResult<StorageRef> {
        Ok(StorageRef::new(format!(
            "{}{}",
            LOCAL_REF_SCHEME,
            Self::file_name(reference)
        )))
    }
}
