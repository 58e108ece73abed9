//! Errors surfaced by the photo repository.

use crate::capture::CaptureError;
use crate::share::ShareError;
use crate::storage::StorageError;
use thiserror::Error;

/// Error kinds the gallery reports to the UI.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("Camera unavailable")]
    DeviceUnavailable,
    #[error("Unsupported environment")]
    UnsupportedEnvironment,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("{0}")]
    Unknown(String),
}

impl GalleryError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            GalleryError::PermissionDenied => {
                "Please grant the app camera permission in settings".to_string()
            }
            GalleryError::DeviceUnavailable => "Camera is not available on this device".to_string(),
            GalleryError::UnsupportedEnvironment => {
                "This environment does not support the camera".to_string()
            }
            GalleryError::NotFound(what) => format!("Photo not found: {}", what),
            GalleryError::Serialization(detail) => format!("Saved photos are corrupted: {}", detail),
            GalleryError::Unknown(message) => message.clone(),
        }
    }
}

impl From<CaptureError> for GalleryError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::PermissionDenied => GalleryError::PermissionDenied,
            CaptureError::DeviceNotFound => GalleryError::DeviceUnavailable,
            CaptureError::Unsupported => GalleryError::UnsupportedEnvironment,
            CaptureError::Unknown(message) => GalleryError::Unknown(message),
        }
    }
}

impl From<StorageError> for GalleryError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => GalleryError::NotFound(what),
            StorageError::Serialization(detail) => GalleryError::Serialization(detail),
            StorageError::Io(message) | StorageError::Other(message) => GalleryError::Unknown(message),
        }
    }
}

impl From<ShareError> for GalleryError {
    fn from(e: ShareError) -> Self {
        GalleryError::Unknown(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_errors_map_to_kinds() {
        assert_eq!(GalleryError::from(CaptureError::PermissionDenied), GalleryError::PermissionDenied);
        assert_eq!(GalleryError::from(CaptureError::DeviceNotFound), GalleryError::DeviceUnavailable);
        assert_eq!(GalleryError::from(CaptureError::Unsupported), GalleryError::UnsupportedEnvironment);
        assert_eq!(
            GalleryError::from(CaptureError::Unknown("boom".into())).user_message(),
            "boom"
        );
    }

    #[test]
    fn test_storage_errors_map_to_kinds() {
        assert!(matches!(
            GalleryError::from(StorageError::Serialization("bad".into())),
            GalleryError::Serialization(_)
        ));
        assert!(matches!(
            GalleryError::from(StorageError::Io("disk full".into())),
            GalleryError::Unknown(m) if m == "disk full"
        ));
    }
}
