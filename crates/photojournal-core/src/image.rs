//! Encoded image payloads and data-URI conversion.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Image format of an encoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// File extension used when naming stored blobs.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::WebP => "webp",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from a MIME type such as `image/jpeg`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        mime.trim()
            .to_lowercase()
            .strip_prefix("image/")
            .and_then(Self::from_extension)
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

/// Errors decoding a data URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("Not a data URI")]
    MissingScheme,
    #[error("Data URI is not base64-encoded")]
    NotBase64,
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),
    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(String),
}

/// One encoded still image (the bytes of a JPEG/PNG/WebP file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(format: ImageFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    /// Wrap raw bytes, sniffing the format. Unknown data is assumed to be JPEG,
    /// which is what both camera paths produce.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let format = ImageFormat::from_magic_bytes(&bytes).unwrap_or(ImageFormat::Jpeg);
        Self { format, bytes }
    }

    /// Encode as `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }

    /// Decode a base64 `data:` URI.
    pub fn from_data_url(url: &str) -> Result<Self, DataUrlError> {
        let rest = url.strip_prefix("data:").ok_or(DataUrlError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingScheme)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(DataUrlError::NotBase64)?;
        let format = ImageFormat::from_mime_type(mime)
            .ok_or_else(|| DataUrlError::UnsupportedType(mime.to_string()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| DataUrlError::InvalidPayload(e.to_string()))?;
        Ok(Self { format, bytes })
    }

    /// Size of the encoded image in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
