//! Command-line shell over the photo repository.

use photojournal_core::{GalleryConfig, GalleryError, Photo, PhotoRepository};
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

/// Usage text for the native binary.
pub const USAGE: &str = "\
Usage: photojournal [--data-dir <path>] [--camera-command <cmd>] <command>

Commands:
  list                  List photos, newest first
  show <id>             Show one photo
  capture [<title>]     Take a photo with the camera command
  title <id> <title>    Set a photo's title
  delete <id>           Delete a photo
  share <id>            Copy a photo's title and location to the clipboard
  gc                    Remove stored photo files no entry refers to

The camera command runs once per capture; `{output}` is replaced with the
path the picture must be written to.";

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Usage(String),
    #[error("No photo with id {0}")]
    UnknownPhoto(String),
    #[error("{0}")]
    Gallery(String),
    #[error("Cannot open photo storage: {0}")]
    Open(#[from] GalleryError),
    #[error("Cannot prepare the camera: {0}")]
    Camera(#[from] std::io::Error),
}

/// Application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub gallery: GalleryConfig,
    /// Program that takes a picture, with `{output}` as the target path.
    pub camera_command: Option<String>,
}

/// One CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Show { id: String },
    Capture { title: Option<String> },
    Title { id: String, title: String },
    Delete { id: String },
    Share { id: String },
    Gc,
}

/// Parse command-line arguments (without the program name).
pub fn parse_args(args: &[String]) -> Result<(AppConfig, Command), AppError> {
    let mut config = AppConfig::default();
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data-dir" => {
                let dir = iter
                    .next()
                    .ok_or_else(|| AppError::Usage("--data-dir needs a path".to_string()))?;
                config.gallery.data_dir = Some(PathBuf::from(dir));
            }
            "--camera-command" => {
                let cmd = iter
                    .next()
                    .ok_or_else(|| AppError::Usage("--camera-command needs a command".to_string()))?;
                config.camera_command = Some(cmd.clone());
            }
            flag if flag.starts_with("--") => {
                return Err(AppError::Usage(format!("Unknown option {}", flag)));
            }
            _ => rest.push(arg.as_str()),
        }
    }

    let id = |i: usize| -> Result<String, AppError> {
        rest.get(i)
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Usage(format!("{} needs a photo id", rest[0])))
    };
    let joined = |from: usize| -> Option<String> {
        (rest.len() > from).then(|| rest[from..].join(" "))
    };

    let command = match rest.first().copied() {
        None | Some("list") => Command::List,
        Some("show") => Command::Show { id: id(1)? },
        Some("capture") => Command::Capture { title: joined(1) },
        Some("title") => Command::Title {
            id: id(1)?,
            title: joined(2).unwrap_or_default(),
        },
        Some("delete") => Command::Delete { id: id(1)? },
        Some("share") => Command::Share { id: id(1)? },
        Some("gc") => Command::Gc,
        Some(other) => return Err(AppError::Usage(format!("Unknown command {}", other))),
    };
    Ok((config, command))
}

fn describe(photo: &Photo) -> String {
    let title = if photo.title.is_empty() { "(untitled)" } else { &photo.title };
    format!(
        "{}  {}  {}",
        photo.id,
        photo.created_at.format("%Y-%m-%d %H:%M:%S"),
        title
    )
}

/// The application: one repository driven by CLI commands.
pub struct App {
    repository: PhotoRepository,
}

impl App {
    pub fn new(repository: PhotoRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &PhotoRepository {
        &self.repository
    }

    fn check(&mut self) -> Result<(), AppError> {
        match self.repository.error() {
            Some(message) => {
                let message = message.to_string();
                self.repository.clear_error();
                Err(AppError::Gallery(message))
            }
            None => Ok(()),
        }
    }

    fn photo(&self, id: &str) -> Result<Photo, AppError> {
        self.repository
            .get_photo_by_id(id)
            .cloned()
            .ok_or_else(|| AppError::UnknownPhoto(id.to_string()))
    }

    /// Load the gallery and run `command`, returning what to print.
    pub async fn execute(&mut self, command: &Command) -> Result<String, AppError> {
        self.repository.load_saved_photos().await;
        self.check()?;

        let mut out = String::new();
        match command {
            Command::List => {
                if self.repository.photos().is_empty() {
                    out.push_str("No photos yet\n");
                }
                for photo in self.repository.photos() {
                    let _ = writeln!(out, "{}", describe(photo));
                }
            }
            Command::Show { id } => {
                let photo = self.photo(id)?;
                let _ = writeln!(out, "{}", describe(&photo));
                let _ = writeln!(out, "file: {}", photo.filepath);
                if let Some(uri) = &photo.webview_path {
                    let _ = writeln!(out, "view: {}", uri);
                }
            }
            Command::Capture { title } => {
                let photo = self.repository.take_photo().await;
                self.check()?;
                match photo {
                    Some(photo) => {
                        if let Some(title) = title {
                            self.repository.save_photo_with_title(&photo, title).await;
                            self.check()?;
                        }
                        let saved = self.photo(&photo.id)?;
                        let _ = writeln!(out, "Saved {}", describe(&saved));
                    }
                    None => out.push_str("Capture cancelled\n"),
                }
            }
            Command::Title { id, title } => {
                let photo = self.photo(id)?;
                self.repository.save_photo_with_title(&photo, title).await;
                self.check()?;
                let _ = writeln!(out, "{}", describe(&self.photo(id)?));
            }
            Command::Delete { id } => {
                let photo = self.photo(id)?;
                self.repository.delete_photo(&photo).await;
                self.check()?;
                let _ = writeln!(out, "Deleted {}", id);
            }
            Command::Share { id } => {
                let photo = self.photo(id)?;
                self.repository.share_photo(&photo).await;
                self.check()?;
                let _ = writeln!(out, "Shared {}", id);
            }
            Command::Gc => {
                let removed = self.repository.collect_orphans().await;
                self.check()?;
                let _ = writeln!(out, "Removed {} orphaned file(s)", removed);
            }
        }
        Ok(out)
    }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
impl App {
    /// Open the on-disk gallery with the desktop camera and clipboard.
    pub fn open(config: &AppConfig) -> Result<Self, AppError> {
        use crate::host::{ClipboardShare, CommandCamera};
        use photojournal_core::capture::NativeCamera;

        let camera = NativeCamera::new(CommandCamera::new(config.camera_command.clone())?);
        let repository = PhotoRepository::open_default(
            &config.gallery,
            Box::new(camera),
            Box::new(ClipboardShare),
        )?;
        Ok(Self::new(repository))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photojournal_core::capture::{CaptureOutcome, CaptureResult};
    use photojournal_core::share::NoShare;
    use photojournal_core::storage::{MemoryBlobStore, MemoryKeyValueStore};
    use photojournal_core::{
        BoxFuture, CaptureAdapter, EncodedImage, ImageFormat, IndexStore, RawImage,
    };
    use pollster::block_on;
    use std::sync::Arc;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    struct StillCamera;

    impl CaptureAdapter for StillCamera {
        fn capture(&self) -> BoxFuture<'_, CaptureResult<CaptureOutcome>> {
            let image = EncodedImage::new(ImageFormat::Jpeg, vec![0xFF, 0xD8, 0xFF, 0xE0]);
            Box::pin(async move { Ok(CaptureOutcome::Captured(RawImage::Inline(image))) })
        }
    }

    fn app() -> App {
        let table = Arc::new(MemoryKeyValueStore::new());
        App::new(PhotoRepository::new(
            Arc::new(MemoryBlobStore::new()),
            IndexStore::new(table, "photos"),
            Box::new(StillCamera),
            Box::new(NoShare),
        ))
    }

    #[test]
    fn test_parse_commands() {
        let (config, command) = parse_args(&args(&["--data-dir", "/tmp/pj", "title", "42", "Blue", "hour"])).unwrap();
        assert_eq!(config.gallery.data_dir, Some(PathBuf::from("/tmp/pj")));
        assert_eq!(command, Command::Title { id: "42".into(), title: "Blue hour".into() });

        assert_eq!(parse_args(&[]).unwrap().1, Command::List);
        assert_eq!(parse_args(&args(&["capture"])).unwrap().1, Command::Capture { title: None });
        assert_eq!(parse_args(&args(&["gc"])).unwrap().1, Command::Gc);

        let (config, _) = parse_args(&args(&["--camera-command", "snap {output}", "capture"])).unwrap();
        assert_eq!(config.camera_command.as_deref(), Some("snap {output}"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_args(&args(&["delete"])), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(&args(&["frobnicate"])), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(&args(&["--verbose"])), Err(AppError::Usage(_))));
        assert!(matches!(parse_args(&args(&["--data-dir"])), Err(AppError::Usage(_))));
    }

    #[test]
    fn test_capture_title_delete() {
        let mut app = app();
        let out = block_on(app.execute(&Command::Capture { title: Some("Pier".into()) })).unwrap();
        assert!(out.starts_with("Saved "));
        assert!(out.contains("Pier"));

        let id = app.repository().photos()[0].id.clone();
        let out = block_on(app.execute(&Command::Title { id: id.clone(), title: "Pier at dusk".into() })).unwrap();
        assert!(out.contains("Pier at dusk"));

        block_on(app.execute(&Command::Delete { id: id.clone() })).unwrap();
        assert!(app.repository().photos().is_empty());
        assert!(matches!(
            block_on(app.execute(&Command::Delete { id })),
            Err(AppError::UnknownPhoto(_))
        ));
    }

    #[test]
    fn test_share_without_share_sheet_fails() {
        let mut app = app();
        block_on(app.execute(&Command::Capture { title: None })).unwrap();
        let id = app.repository().photos()[0].id.clone();

        let result = block_on(app.execute(&Command::Share { id }));
        assert!(matches!(result, Err(AppError::Gallery(m)) if m.contains("not available")));
        assert_eq!(app.repository().error(), None);
    }

    #[cfg(all(feature = "native", unix))]
    #[test]
    fn test_open_persists_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let (config, capture) = parse_args(&args(&[
            "--data-dir",
            dir.path().to_str().unwrap(),
            "--camera-command",
            "printf 'jpeg' > {output}",
            "capture",
            "Garden",
        ]))
        .unwrap();

        let mut first = App::open(&config).unwrap();
        block_on(first.execute(&capture)).unwrap();

        let mut second = App::open(&config).unwrap();
        let out = block_on(second.execute(&Command::List)).unwrap();
        assert!(out.contains("Garden"));
        assert!(dir.path().join("photos").read_dir().unwrap().next().is_some());
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_capture_without_camera_command() {
        let dir = tempfile::tempdir().unwrap();
        let (config, command) =
            parse_args(&args(&["--data-dir", dir.path().to_str().unwrap(), "capture"])).unwrap();
        let mut app = App::open(&config).unwrap();
        let result = block_on(app.execute(&command));
        assert!(matches!(result, Err(AppError::Gallery(m)) if m.contains("does not support")));
    }

    #[test]
    fn test_list_empty() {
        let mut app = app();
        assert_eq!(block_on(app.execute(&Command::List)).unwrap(), "No photos yet\n");
    }
}
