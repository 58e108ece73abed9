//! Photo Journal Core Library
//!
//! Photo persistence and platform abstraction for the Photo Journal app:
//! capture, blob storage, the gallery index, and the repository that keeps
//! them consistent.

pub mod capture;
pub mod config;
pub mod error;
pub mod image;
pub mod photo;
pub mod platform;
pub mod repository;
pub mod share;
pub mod storage;

pub use capture::{CaptureAdapter, CaptureError, CaptureOutcome, RawImage};
pub use config::GalleryConfig;
pub use error::GalleryError;
pub use image::{EncodedImage, ImageFormat};
pub use photo::{Photo, PhotoGalleryState, PhotoPhase};
pub use platform::{Platform, is_native_host};
pub use repository::PhotoRepository;
pub use share::{ShareError, ShareRequest, ShareTarget};
pub use storage::{BlobStore, IndexStore, KeyValueStore, StorageError, StorageRef, StorageResult};

use std::future::Future;
use std::pin::Pin;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Thread-safety bound for platform backends.
///
/// Native backends must be `Send + Sync`. On WASM the bound is relaxed since
/// everything runs on the single browser thread and JS handles are not `Send`.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

/// Thread-safety bound for platform backends (WASM version, no bounds).
#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}

#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}
