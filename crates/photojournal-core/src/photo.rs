//! Photo records and gallery state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One photo in the journal.
///
/// Serialized as an element of the gallery index. `webview_path` is derived
/// from `filepath` at load time and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Creation timestamp in epoch milliseconds, unique within the index.
    pub id: String,
    /// Storage reference of the photo's blob.
    pub filepath: String,
    /// User caption.
    #[serde(default)]
    pub title: String,
    /// Renderable URI, recomputed from `filepath` on load.
    #[serde(skip_serializing, default)]
    pub webview_path: Option<String>,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
}

impl Photo {
    /// Create an untitled photo record.
    pub fn new(id: impl Into<String>, filepath: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            filepath: filepath.into(),
            title: String::new(),
            webview_path: None,
            created_at,
        }
    }

    /// Set the renderable URI.
    pub fn with_webview_path(mut self, path: impl Into<String>) -> Self {
        self.webview_path = Some(path.into());
        self
    }

    /// Blob filename for a photo created with `id`.
    pub fn file_name_for(id: &str, extension: &str) -> String {
        format!("photo_{}.{}", id, extension)
    }
}

/// Pick the id for a photo created at `now`.
///
/// Ids are epoch milliseconds; a value already taken in `existing` is bumped
/// until it is free.
pub fn next_photo_id(now: DateTime<Utc>, existing: &[Photo]) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let candidate = millis.to_string();
        if !existing.iter().any(|p| p.id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}

/// Lifecycle phase of the photo an operation is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoPhase {
    Capturing,
    Saving,
    Persisted,
    Deleting,
    Deleted,
}

impl fmt::Display for PhotoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhotoPhase::Capturing => "capturing",
            PhotoPhase::Saving => "saving",
            PhotoPhase::Persisted => "persisted",
            PhotoPhase::Deleting => "deleting",
            PhotoPhase::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// In-memory gallery state consumed by the UI.
///
/// Rebuilt from the index and blob store on every startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoGalleryState {
    /// Photos, newest first.
    pub photos: Vec<Photo>,
    /// Whether an operation is in flight.
    pub loading: bool,
    /// Last error message; sticky until cleared.
    pub error: Option<String>,
    /// Phase of the photo the in-flight operation is working on.
    pub phase: Option<PhotoPhase>,
}

impl PhotoGalleryState {
    pub fn find(&self, id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_photo_json_shape() {
        let photo = Photo::new("1700000000000", "local://photo_1700000000000.jpeg", at(1_700_000_000_000))
            .with_webview_path("data:image/jpeg;base64,AQID");

        let json = serde_json::to_value(&photo).unwrap();
        assert_eq!(json["id"], "1700000000000");
        assert_eq!(json["filepath"], "local://photo_1700000000000.jpeg");
        assert_eq!(json["title"], "");
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");
        assert!(json.get("webviewPath").is_none());
    }

    #[test]
    fn test_photo_accepts_legacy_fields() {
        // Older indexes carried webviewPath and may lack a title.
        let json = r#"{
            "id": "1",
            "filepath": "photo_1.jpeg",
            "webviewPath": "stale",
            "createdAt": "2024-05-01T10:00:00.000Z"
        }"#;
        let photo: Photo = serde_json::from_str(json).unwrap();
        assert_eq!(photo.title, "");
        assert_eq!(photo.webview_path.as_deref(), Some("stale"));
        assert_eq!(photo.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_next_photo_id_is_unique() {
        let now = at(1_000);
        assert_eq!(next_photo_id(now, &[]), "1000");

        let existing = vec![Photo::new("1000", "a", now), Photo::new("1001", "b", now)];
        assert_eq!(next_photo_id(now, &existing), "1002");
    }

    #[test]
    fn test_file_name_for() {
        assert_eq!(Photo::file_name_for("42", "jpeg"), "photo_42.jpeg");
    }
}
