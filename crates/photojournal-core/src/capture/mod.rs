//! Camera capture abstraction.
//!
//! A [`CaptureAdapter`] obtains one still image from the user. Two variants:
//! the native camera, which delegates to a host camera capability, and the web
//! camera, which drives a live video preview in the browser.

#[cfg(not(target_arch = "wasm32"))]
mod native;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use native::{CameraOptions, CameraResultType, CameraSource, HostCamera, HostPhoto, NativeCamera};

#[cfg(target_arch = "wasm32")]
pub use web::WebCamera;

use crate::image::EncodedImage;
use crate::{BoxFuture, MaybeSendSync};
use thiserror::Error;

/// Capture failures. User cancellation is not one of them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("No camera found")]
    DeviceNotFound,
    #[error("Camera not supported in this environment")]
    Unsupported,
    #[error("{0}")]
    Unknown(String),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Image produced by a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawImage {
    /// Encoded data in hand.
    Inline(EncodedImage),
    /// A resource the adapter can fetch (a host file path or URI, or a data URI).
    Reference(String),
}

/// Outcome of one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured(RawImage),
    /// The user backed out. Not an error.
    Cancelled,
}

/// Source of raw image captures.
pub trait CaptureAdapter: MaybeSendSync {
    /// Whether a camera can be used at all in this environment.
    fn is_supported(&self) -> bool {
        true
    }

    /// Capture one image. May wait indefinitely on the user.
    fn capture(&self) -> BoxFuture<'_, CaptureResult<CaptureOutcome>>;

    /// Turn a [`RawImage::Reference`] produced by this adapter into encoded
    /// data. The default only understands data URIs.
    fn fetch(&self, reference: &str) -> BoxFuture<'_, CaptureResult<EncodedImage>> {
        let result = decode_data_url(reference);
        Box::pin(async move { result })
    }
}

/// Decode a data URI reference.
pub fn decode_data_url(reference: &str) -> CaptureResult<EncodedImage> {
    EncodedImage::from_data_url(reference)
        .map_err(|e| CaptureError::Unknown(format!("Cannot read captured image: {}", e)))
}

/// Resolve a raw capture into encoded bytes ready for storage.
pub async fn resolve_raw_image<C: CaptureAdapter + ?Sized>(
    adapter: &C,
    raw: RawImage,
) -> CaptureResult<EncodedImage> {
    match raw {
        RawImage::Inline(image) => Ok(image),
        RawImage::Reference(reference) if reference.starts_with("data:") => {
            decode_data_url(&reference)
        }
        RawImage::Reference(reference) => adapter.fetch(&reference).await,
    }
}
