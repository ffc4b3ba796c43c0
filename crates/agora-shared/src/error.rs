use thiserror::Error;

use crate::constants::MAX_IMAGE_SIZE;

/// Rejected user input. Caught at the point of user action and shown inline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Post text must not be empty")]
    EmptyText,

    #[error("Comment text must not be empty")]
    EmptyComment,

    #[error("Image size must be less than 5MB ({size} bytes, max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Unsupported image data")]
    UnsupportedImage,
}

impl ValidationError {
    pub fn image_too_large(size: usize) -> Self {
        Self::ImageTooLarge {
            size,
            max: MAX_IMAGE_SIZE,
        }
    }
}

/// Identity and session failures. These keep the authentication gate closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Sign-in rejected: {0}")]
    Rejected(String),

    #[error("Malformed session token")]
    InvalidToken,

    #[error("Session expired")]
    Expired,

    #[error("Session signature does not verify")]
    BadSignature,

    #[error("Identity provider unreachable: {0}")]
    Transport(String),
}
