//! File-based blob storage for native platforms.

use super::{BlobStore, StorageError, StorageRef, StorageResult};
use crate::BoxFuture;
use crate::image::EncodedImage;
use std::fs;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// File-based blob storage for native platforms.
///
/// Stores each photo as a file in the app-private data directory. References
/// are absolute file paths.
pub struct FileBlobStore {
    /// Base directory for photo files.
    base_path: PathBuf,
}

impl FileBlobStore {
    /// Create a new file blob store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist. The base is stored in its
    /// canonical absolute form so references stay valid whatever the working
    /// directory or spelling of `base_path`.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create photo directory: {}", e))
            })?;
        }
        let base_path = fs::canonicalize(&base_path).map_err(|e| {
            StorageError::Io(format!(
                "Failed to resolve photo directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        Ok(Self { base_path })
    }

    /// Get the file path for a blob key.
    fn blob_path(&self, key: &str) -> PathBuf {
        // Sanitize key to be safe for filenames
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.base_path.join(safe_key)
    }

    /// Resolve a reference (absolute path, `file://` URL, or bare file name)
    /// to a file directly inside the base directory.
    ///
    /// Anything that lands elsewhere is reported as not found: this store
    /// never touches files it did not write.
    fn resolve(&self, reference: &StorageRef) -> StorageResult<PathBuf> {
        let raw = reference.as_str();
        let path = if raw.starts_with("file://") {
            let url = Url::parse(raw)
                .map_err(|e| StorageError::Other(format!("Invalid file URL {}: {}", raw, e)))?;
            url.to_file_path()
                .map_err(|_| StorageError::Other(format!("Not a local file URL: {}", raw)))?
        } else {
            let path = Path::new(raw);
            if path.is_absolute() {
                path.to_path_buf()
            } else if path.components().count() == 1 {
                self.base_path.join(path)
            } else {
                return Err(StorageError::NotFound(raw.to_string()));
            }
        };

        let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Err(StorageError::NotFound(raw.to_string()));
        };
        let parent = fs::canonicalize(parent).unwrap_or_else(|_| normalize(parent));
        if parent != self.base_path {
            log::warn!("Refusing photo reference outside {}: {}", self.base_path.display(), raw);
            return Err(StorageError::NotFound(raw.to_string()));
        }
        Ok(parent.join(file_name))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

/// Lexically drop `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

impl BlobStore for FileBlobStore {
    fn write(&self, key: &str, image: &EncodedImage) -> BoxFuture<'_, StorageResult<StorageRef>> {
        let path = self.blob_path(key);
        let bytes = image.bytes.clone();

        Box::pin(async move {
            fs::write(&path, bytes).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })?;
            Ok(StorageRef::new(path.to_string_lossy().into_owned()))
        })
    }

    fn read(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<EncodedImage>> {
        let path = self.resolve(reference);
        let reference = reference.clone();

        Box::pin(async move {
            let path = path?;
            if !path.exists() {
                return Err(StorageError::NotFound(reference.into_string()));
            }

            let bytes = fs::read(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Ok(EncodedImage::from_bytes(bytes))
        })
    }

    fn delete(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.resolve(reference);
        let reference = reference.clone();

        Box::pin(async move {
            let path = path?;
            if !path.exists() {
                return Err(StorageError::NotFound(reference.into_string()));
            }
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })
        })
    }

    fn exists(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.resolve(reference);
        Box::pin(async move {
            match path {
                Ok(path) => Ok(path.is_file()),
                Err(StorageError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            }
        })
    }

    fn to_renderable(&self, reference: &StorageRef) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.resolve(reference);
        Box::pin(async move {
            let path = path?;
            Url::from_file_path(&path)
                .map(String::from)
                .map_err(|_| StorageError::Other(format!("Cannot convert {} to a URL", path.display())))
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<StorageRef>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base).map_err(|e| {
                StorageError::Io(format!("Failed to read directory: {}", e))
            })?;

            let mut refs: Vec<StorageRef> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .map(|path| StorageRef::new(path.to_string_lossy().into_owned()))
                .collect();
            refs.sort();
            Ok(refs)
        })
    }

    fn canonical(&self, reference: &StorageRef) -> StorageResult<StorageRef> {
        let path = self.resolve(reference)?;
        Ok(StorageRef::new(path.to_string_lossy().into_owned()))
    }
}
