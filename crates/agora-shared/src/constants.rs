/// Application name
pub const APP_NAME: &str = "Agora";

/// Collection holding every post document
pub const POSTS_COLLECTION: &str = "posts";

/// Collection holding one profile document per user, keyed by user id
pub const PROFILES_COLLECTION: &str = "userProfiles";

/// Author index maintained alongside post writes, keyed by user id
pub const AUTHORS_COLLECTION: &str = "authors";

/// Maximum inline image size in bytes (5 MiB)
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Display name used when the identity provider has none
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous";

/// Name shown in the stories strip when an author has neither name nor email
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Generated-avatar service used when an author has no photo
pub const AVATAR_FALLBACK_URL: &str = "https://ui-avatars.com/api/";

/// Session token lifetime in hours (7 days)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Key derivation context for user ids (BLAKE3)
pub const KDF_CONTEXT_USER_ID: &str = "agora-user-id-v1";

/// Number of hash bytes kept in a derived user id
pub const USER_ID_BYTES: usize = 16;
