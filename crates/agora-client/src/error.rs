use agora_shared::{AuthError, ValidationError};
use agora_store::StoreError;
use thiserror::Error;

/// Errors surfaced by client views and commands.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Post not found: {0}")]
    PostNotFound(String),
}

impl ClientError {
    /// Whether the error is a rejected user input that should be shown
    /// inline rather than logged.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
