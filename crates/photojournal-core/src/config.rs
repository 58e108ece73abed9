//! Gallery configuration.

use crate::storage::{StorageError, StorageResult};
use std::path::PathBuf;

/// Key of the gallery index in the key/value table.
pub const PHOTO_INDEX_KEY: &str = "photos";

/// Directory (under the data directory) holding photo files.
pub const PHOTOS_DIR_NAME: &str = "photos";

/// Preference file (under the data directory) on native hosts.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Application configuration for the photo gallery.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryConfig {
    pub app_name: String,
    pub app_id: String,
    /// Key of the gallery index.
    pub index_key: String,
    /// Overrides the platform data directory (native only).
    pub data_dir: Option<PathBuf>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            app_name: "Photo Journal".to_string(),
            app_id: "com.photojournal.app".to_string(),
            index_key: PHOTO_INDEX_KEY.to_string(),
            data_dir: None,
        }
    }
}

impl GalleryConfig {
    /// Use `dir` instead of the platform data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// The app-private data directory.
    ///
    /// On Unix: `~/.local/share/photojournal/`
    /// On Windows: `%LOCALAPPDATA%\photojournal\`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn data_dir(&self) -> StorageResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Ok(base.join("photojournal"))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn data_dir(&self) -> StorageResult<PathBuf> {
        self.data_dir
            .clone()
            .ok_or_else(|| StorageError::Other("No data directory in the browser".to_string()))
    }
}
