use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{KDF_CONTEXT_USER_ID, USER_ID_BYTES};

// User identity = hex of the first 16 BLAKE3 bytes of the normalised email
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Derive the stable user id for an email address.
    ///
    /// The same address always maps to the same id, regardless of case or
    /// surrounding whitespace.
    pub fn from_email(email: &str) -> Self {
        let normalised = email.trim().to_lowercase();
        let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_USER_ID);
        hasher.update(normalised.as_bytes());
        let hash = hasher.finalize();
        Self(hex::encode(&hash.as_bytes()[..USER_ID_BYTES]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Document id of a post, assigned by the store on creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    /// Random v4 id; two comments created in the same instant never collide.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Empty id, used for legacy comments stored without one. Decoding the same
/// record twice gives the same id.
impl Default for CommentId {
    fn default() -> Self {
        Self(String::new())
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
