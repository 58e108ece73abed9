//! Host share-sheet abstraction.

use crate::photo::Photo;
use crate::{BoxFuture, MaybeSendSync};
use thiserror::Error;

const DEFAULT_SHARE_TITLE: &str = "Share photo";
const SHARE_DIALOG_TITLE: &str = "Share your photo";

/// Share failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("Sharing is not available on this device")]
    Unavailable,
    #[error("{0}")]
    Failed(String),
}

/// What to hand to the share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub url: String,
    pub dialog_title: String,
}

impl ShareRequest {
    /// Share request for a photo record.
    pub fn for_photo(photo: &Photo) -> Self {
        let title = if photo.title.is_empty() {
            DEFAULT_SHARE_TITLE.to_string()
        } else {
            photo.title.clone()
        };
        Self {
            title,
            text: photo.title.clone(),
            url: photo.filepath.clone(),
            dialog_title: SHARE_DIALOG_TITLE.to_string(),
        }
    }
}

/// The host's sharing capability.
pub trait ShareTarget: MaybeSendSync {
    fn share(&self, request: ShareRequest) -> BoxFuture<'_, Result<(), ShareError>>;
}

/// Share target for hosts without a share sheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn share(&self, _request: ShareRequest) -> BoxFuture<'_, Result<(), ShareError>> {
        Box::pin(async { Err(ShareError::Unavailable) })
    }
}
