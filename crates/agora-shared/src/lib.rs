//! # agora-shared
//!
//! Types shared by every Agora crate: the post/comment/profile document
//! model, timestamp resolution, inline image handling, signed session
//! tokens and the validation/auth error taxonomy.

pub mod constants;
pub mod error;
pub mod media;
pub mod models;
pub mod session;
pub mod timestamp;
pub mod types;

pub use error::{AuthError, ValidationError};
pub use models::{Comment, Post, Profile, Session};
pub use timestamp::StoreTimestamp;
pub use types::{CommentId, PostId, UserId};
