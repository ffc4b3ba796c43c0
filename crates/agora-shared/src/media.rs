//! Inline image attachments.
//!
//! Images are not uploaded to a separate blob store: an accepted image is
//! embedded in the post record as a `data:` URI.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::constants::MAX_IMAGE_SIZE;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    mime: &'static str,
    size: usize,
    data_uri: String,
}

impl InlineImage {
    /// Validate and embed raw image bytes.
    ///
    /// The size ceiling is inclusive: exactly [`MAX_IMAGE_SIZE`] bytes is
    /// accepted. The format is sniffed from magic bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(ValidationError::image_too_large(bytes.len()));
        }

        let format = image::guess_format(bytes).map_err(|_| ValidationError::UnsupportedImage)?;
        let mime = format.to_mime_type();
        if !mime.starts_with("image/") {
            return Err(ValidationError::UnsupportedImage);
        }

        Ok(Self {
            mime,
            size: bytes.len(),
            data_uri: format!("data:{mime};base64,{}", STANDARD.encode(bytes)),
        })
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }

    /// Size formatted the way the composer shows it, e.g. `1.2MB`.
    pub fn size_label(&self) -> String {
        format!("{:.1}MB", self.size as f64 / 1024.0 / 1024.0)
    }
}
