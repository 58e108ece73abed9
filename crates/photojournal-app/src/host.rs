//! Desktop host capabilities: an external camera program and the clipboard
//! as share target.

use photojournal_core::capture::{CameraOptions, CaptureResult, HostCamera, HostPhoto};
use photojournal_core::{BoxFuture, CaptureError, ShareError, ShareRequest, ShareTarget};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

/// Placeholder in the camera command replaced by the output path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Camera backed by a user-configured shell command.
///
/// The command is expected to write a JPEG to the path substituted for
/// `{output}`. Exiting successfully without writing it counts as cancelled.
/// Captures land in a private temporary directory removed on drop.
#[derive(Debug)]
pub struct CommandCamera {
    command: Option<String>,
    output_dir: TempDir,
    captures: AtomicU32,
}

impl CommandCamera {
    pub fn new(command: Option<String>) -> io::Result<Self> {
        let output_dir = tempfile::Builder::new()
            .prefix("photojournal-capture")
            .tempdir()?;
        Ok(Self {
            command,
            output_dir,
            captures: AtomicU32::new(0),
        })
    }

    fn output_path(&self, n: u32) -> PathBuf {
        self.output_dir.path().join(format!("capture-{}.jpeg", n))
    }

    fn next_output_path(&self) -> io::Result<PathBuf> {
        let path = self.output_path(self.captures.fetch_add(1, Ordering::Relaxed));
        // Only a file the command writes counts as a capture.
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(path),
        }
    }

    fn run(&self, command: &str, options: &CameraOptions) -> CaptureResult<Option<HostPhoto>> {
        let output = self
            .next_output_path()
            .map_err(|e| CaptureError::Unknown(format!("Cannot prepare capture file: {}", e)))?;
        let output_str = output.to_string_lossy();
        let line = if command.contains(OUTPUT_PLACEHOLDER) {
            command.replace(OUTPUT_PLACEHOLDER, &output_str)
        } else {
            format!("{} {}", command, output_str)
        };
        log::debug!(
            "Running camera command ({}x{}, quality {}): {}",
            options.width,
            options.height,
            options.quality,
            line
        );

        let mut shell = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C");
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c");
            c
        };
        let status = shell.arg(&line).status().map_err(|e| match e.kind() {
            ErrorKind::NotFound => CaptureError::DeviceNotFound,
            ErrorKind::PermissionDenied => CaptureError::PermissionDenied,
            _ => CaptureError::Unknown(format!("Cannot run camera command: {}", e)),
        })?;

        // 127 is the shell's "command not found".
        match status.code() {
            Some(127) => return Err(CaptureError::DeviceNotFound),
            Some(126) => return Err(CaptureError::PermissionDenied),
            _ => {}
        }
        if !status.success() {
            return Err(CaptureError::Unknown(format!("Camera command failed ({})", status)));
        }

        if output.is_file() {
            Ok(Some(HostPhoto {
                path: output.to_string_lossy().into_owned(),
            }))
        } else {
            Ok(None)
        }
    }
}

impl HostCamera for CommandCamera {
    fn is_available(&self) -> bool {
        self.command.is_some()
    }

    fn get_photo(&self, options: &CameraOptions) -> BoxFuture<'_, CaptureResult<Option<HostPhoto>>> {
        let options = options.clone();
        Box::pin(async move {
            match &self.command {
                Some(command) => self.run(command, &options),
                None => Err(CaptureError::Unsupported),
            }
        })
    }
}

/// Shares by copying the title and location to the system clipboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClipboardShare;

impl ShareTarget for ClipboardShare {
    fn share(&self, request: ShareRequest) -> BoxFuture<'_, Result<(), ShareError>> {
        Box::pin(async move {
            let mut clipboard = arboard::Clipboard::new().map_err(|e| match e {
                arboard::Error::ClipboardNotSupported => ShareError::Unavailable,
                other => ShareError::Failed(other.to_string()),
            })?;
            let text = if request.text.is_empty() {
                request.url.clone()
            } else {
                format!("{}\n{}", request.text, request.url)
            };
            clipboard
                .set_text(text)
                .map_err(|e| ShareError::Failed(e.to_string()))?;
            log::info!("{}: copied to clipboard", request.dialog_title);
            Ok(())
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use photojournal_core::CaptureAdapter;
    use photojournal_core::RawImage;
    use photojournal_core::capture::{CaptureOutcome, NativeCamera};
    use pollster::block_on;

    fn camera(command: &str) -> CommandCamera {
        CommandCamera::new(Some(command.to_string())).unwrap()
    }

    #[test]
    fn test_command_writes_picture() {
        let host = camera("printf 'shot' > {output}");
        let photo = block_on(host.get_photo(&CameraOptions::NATIVE)).unwrap().unwrap();
        assert!(photo.path.starts_with(&*host.output_dir.path().to_string_lossy()));
        assert_eq!(std::fs::read(&photo.path).unwrap(), b"shot");
    }

    #[test]
    fn test_no_output_is_cancel() {
        let adapter = NativeCamera::new(camera("true"));
        let outcome = block_on(adapter.capture()).unwrap();
        assert!(matches!(outcome, CaptureOutcome::Cancelled));
    }

    #[test]
    fn test_stale_output_is_not_a_capture() {
        let host = camera("true");
        std::fs::write(host.output_path(0), b"left over").unwrap();

        let adapter = NativeCamera::new(host);
        let outcome = block_on(adapter.capture()).unwrap();
        assert!(matches!(outcome, CaptureOutcome::Cancelled));
        assert!(!adapter.host().output_path(0).exists());
    }

    #[test]
    fn test_captures_removed_on_drop() {
        let host = camera("printf 'shot' > {output}");
        let photo = block_on(host.get_photo(&CameraOptions::NATIVE)).unwrap().unwrap();
        let dir = host.output_dir.path().to_path_buf();
        drop(host);
        assert!(!std::path::Path::new(&photo.path).exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_failures_map_to_kinds() {
        let missing = camera("photojournal-no-such-camera-binary {output}");
        assert_eq!(
            block_on(missing.get_photo(&CameraOptions::NATIVE)),
            Err(CaptureError::DeviceNotFound)
        );

        let failing = camera("exit 3");
        assert!(matches!(
            block_on(failing.get_photo(&CameraOptions::NATIVE)),
            Err(CaptureError::Unknown(_))
        ));
    }

    #[test]
    fn test_unconfigured_is_unsupported() {
        let adapter = NativeCamera::new(CommandCamera::new(None).unwrap());
        assert!(!adapter.is_supported());
    }

    #[test]
    fn test_captured_reference_is_fetchable() {
        let adapter = NativeCamera::new(camera("printf '\\377\\330\\377' > {output}"));
        let CaptureOutcome::Captured(RawImage::Reference(path)) = block_on(adapter.capture()).unwrap() else {
            panic!("expected a reference");
        };
        let image = block_on(adapter.fetch(&path)).unwrap();
        assert_eq!(image.bytes, vec![0xFF, 0xD8, 0xFF]);
    }
}
