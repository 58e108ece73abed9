//! Photo Journal Application
//!
//! Application shells around the photo repository: a command-line gallery on
//! the desktop and a `WebGallery` handle for the browser.

mod app;
mod session;

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
mod host;

pub use app::{App, AppConfig, AppError, Command, USAGE, parse_args};
pub use session::GallerySession;

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub use host::{ClipboardShare, CommandCamera};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{WebGallery, run_wasm};
