//! Storage abstraction for photo blobs and the gallery index.
//!
//! Two capabilities, each with a native and a web backend:
//!
//! - [`BlobStore`] holds the encoded image of each photo.
//! - [`KeyValueStore`] is the platform preference table; [`IndexStore`]
//!   keeps the gallery index in it as one JSON document.

mod index;
mod local;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(not(target_arch = "wasm32"))]
mod preferences;

#[cfg(target_arch = "wasm32")]
mod browser;

pub use index::IndexStore;
pub use local::{LOCAL_REF_SCHEME, LocalBlobStore, StoredBlob, blob_key};
pub use memory::{MemoryBlobStore, MemoryKeyValueStore};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileBlobStore;
#[cfg(not(target_arch = "wasm32"))]
pub use preferences::FilePreferences;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserLocalStorage;

use crate::image::EncodedImage;
use crate::{BoxFuture, MaybeSendSync};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Opaque reference a [`BlobStore`] hands out from `write`.
///
/// A file path on native, a `local://<filename>` token on the web.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageRef(String);

impl StorageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StorageRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StorageRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Byte storage for encoded photo payloads.
///
/// `delete` and `read` report [`StorageError::NotFound`] for a missing entry;
/// callers that only care about absence must tolerate it.
pub trait BlobStore: MaybeSendSync {
    /// Store `image` under `key`, returning the reference to keep in the index.
    fn write(&self, key: &str, image: &EncodedImage) -> BoxFuture<'_, StorageResult<StorageRef>>;

    /// Read back a stored image.
    fn read(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<EncodedImage>>;

    /// Remove a stored image.
    fn delete(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<()>>;

    /// Check whether a stored image is still present.
    fn exists(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<bool>>;

    /// URI a display surface can render directly.
    fn to_renderable(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<String>>;

    /// References of every stored image.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<StorageRef>>>;

    /// The spelling of `reference` that [`list`](Self::list) uses for the
    /// same entry. Stores that accept several spellings must override this.
    fn canonical(&self, reference: &StorageRef) -> StorageResult<StorageRef> {
        Ok(reference.clone())
    }
}

/// String key/value table: the native preference store or `localStorage`.
pub trait KeyValueStore: MaybeSendSync {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<String>>>;

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    fn keys(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;
}

/// Platform blob store: files under the app data directory.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformBlobStore = FileBlobStore;

/// Platform blob store: `localStorage` entries.
#[cfg(target_arch = "wasm32")]
pub type PlatformBlobStore = LocalBlobStore<BrowserLocalStorage>;

/// Platform key/value table.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformKeyValueStore = FilePreferences;

#[cfg(target_arch = "wasm32")]
pub type PlatformKeyValueStore = BrowserLocalStorage;

/// Create the platform stores for `config`.
///
/// This is the single place the native/web choice is made.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_stores(
    config: &crate::GalleryConfig,
) -> StorageResult<(Arc<PlatformBlobStore>, IndexStore)> {
    let base = config.data_dir()?;
    let blobs = Arc::new(FileBlobStore::new(base.join(crate::config::PHOTOS_DIR_NAME))?);
    let preferences = Arc::new(FilePreferences::open(
        base.join(crate::config::PREFERENCES_FILE_NAME),
    )?);
    Ok((blobs, IndexStore::new(preferences, config.index_key.clone())))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_stores(
    config: &crate::GalleryConfig,
) -> StorageResult<(Arc<PlatformBlobStore>, IndexStore)> {
    let table = Arc::new(BrowserLocalStorage::new()?);
    let blobs = Arc::new(LocalBlobStore::new(table.clone()));
    Ok((blobs, IndexStore::new(table, config.index_key.clone())))
}
