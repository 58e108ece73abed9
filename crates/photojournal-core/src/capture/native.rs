//! Native camera: delegates to the host's camera capability.

use super::{CaptureAdapter, CaptureError, CaptureOutcome, CaptureResult, RawImage};
use crate::BoxFuture;
use crate::MaybeSendSync;
use crate::image::EncodedImage;
use std::fs;
use std::path::PathBuf;
use url::Url;

/// How the host should hand back the picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraResultType {
    /// A path or URI to the stored picture.
    Uri,
    /// Inline base64 data.
    Base64,
}

/// Where the host takes the picture from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSource {
    /// The live camera.
    Camera,
    /// The system photo library.
    Photos,
}

/// Options passed to the host camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraOptions {
    pub result_type: CameraResultType,
    pub source: CameraSource,
    /// JPEG quality, 0..=100.
    pub quality: u8,
    pub allow_editing: bool,
    /// Also save into the system gallery.
    pub save_to_gallery: bool,
    pub width: u32,
    pub height: u32,
}

impl CameraOptions {
    /// Options used for every journal capture. Always the live camera, never
    /// the library picker.
    pub const NATIVE: CameraOptions = CameraOptions {
        result_type: CameraResultType::Uri,
        source: CameraSource::Camera,
        quality: 90,
        allow_editing: false,
        save_to_gallery: false,
        width: 1920,
        height: 1920,
    };
}

/// Picture returned by the host camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPhoto {
    /// Path or `file://` URI of the picture.
    pub path: String,
}

/// The host's camera capability.
pub trait HostCamera: MaybeSendSync {
    /// Whether the host has a camera to offer.
    fn is_available(&self) -> bool {
        true
    }

    /// Take one picture. `Ok(None)` when the user cancels.
    fn get_photo(&self, options: &CameraOptions) -> BoxFuture<'_, CaptureResult<Option<HostPhoto>>>;
}

/// Capture adapter over a [`HostCamera`].
pub struct NativeCamera<H: HostCamera> {
    host: H,
}

impl<H: HostCamera> NativeCamera<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

fn reference_path(reference: &str) -> CaptureResult<PathBuf> {
    if reference.starts_with("file://") {
        let url = Url::parse(reference)
            .map_err(|e| CaptureError::Unknown(format!("Invalid photo URI {}: {}", reference, e)))?;
        url.to_file_path()
            .map_err(|_| CaptureError::Unknown(format!("Not a local photo URI: {}", reference)))
    } else {
        Ok(PathBuf::from(reference))
    }
}

impl<H: HostCamera> CaptureAdapter for NativeCamera<H> {
    fn is_supported(&self) -> bool {
        self.host.is_available()
    }

    fn capture(&self) -> BoxFuture<'_, CaptureResult<CaptureOutcome>> {
        Box::pin(async move {
            let photo = self.host.get_photo(&CameraOptions::NATIVE).await?;
            Ok(match photo {
                Some(photo) => {
                    log::debug!("Host camera returned {}", photo.path);
                    CaptureOutcome::Captured(RawImage::Reference(photo.path))
                }
                None => CaptureOutcome::Cancelled,
            })
        })
    }

    fn fetch(&self, reference: &str) -> BoxFuture<'_, CaptureResult<EncodedImage>> {
        let path = reference_path(reference);
        Box::pin(async move {
            let path = path?;
            let bytes = fs::read(&path).map_err(|e| {
                CaptureError::Unknown(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Ok(EncodedImage::from_bytes(bytes))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::resolve_raw_image;
    use crate::image::ImageFormat;
    use pollster::block_on;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FakeHost {
        result: CaptureResult<Option<HostPhoto>>,
        seen: Mutex<Vec<CameraOptions>>,
    }

    impl HostCamera for FakeHost {
        fn get_photo(&self, options: &CameraOptions) -> BoxFuture<'_, CaptureResult<Option<HostPhoto>>> {
            self.seen.lock().unwrap().push(options.clone());
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    fn camera(result: CaptureResult<Option<HostPhoto>>) -> NativeCamera<FakeHost> {
        NativeCamera::new(FakeHost { result, seen: Mutex::new(Vec::new()) })
    }

    #[test]
    fn test_requests_live_camera() {
        let camera = camera(Ok(None));
        block_on(camera.capture()).unwrap();

        let seen = camera.host().seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[CameraOptions::NATIVE]);
        assert_eq!(seen[0].source, CameraSource::Camera);
        assert_eq!(seen[0].quality, 90);
        assert!(!seen[0].allow_editing && !seen[0].save_to_gallery);
        assert_eq!((seen[0].width, seen[0].height), (1920, 1920));
    }

    #[test]
    fn test_cancel_and_failure() {
        assert_eq!(block_on(camera(Ok(None)).capture()), Ok(CaptureOutcome::Cancelled));
        assert_eq!(
            block_on(camera(Err(CaptureError::PermissionDenied)).capture()),
            Err(CaptureError::PermissionDenied)
        );
    }

    #[test]
    fn test_fetch_reads_host_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.jpg");
        fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let camera = camera(Ok(Some(HostPhoto {
            path: path.to_string_lossy().into_owned(),
        })));
        let CaptureOutcome::Captured(raw) = block_on(camera.capture()).unwrap() else {
            panic!("expected a capture");
        };
        let image = block_on(resolve_raw_image(&camera, raw)).unwrap();
        assert_eq!(image.format, ImageFormat::Jpeg);
        assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);

        let url = Url::from_file_path(&path).unwrap();
        assert!(block_on(camera.fetch(url.as_str())).is_ok());
    }
}
