use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The addressed document does not exist.
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// Stored or submitted JSON could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Collection name or document id is not acceptable.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Documents must be JSON objects.
    #[error("Document body must be a JSON object")]
    NotAnObject,

    /// A field operation targeted a field that is not an array.
    #[error("Field '{field}' is not an array")]
    FieldType { field: String },

    /// The connection mutex was poisoned by a panicking holder.
    #[error("Store lock poisoned")]
    Poisoned,

    /// The remote store could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote store answered with an error status.
    #[error("Remote store error ({status}): {message}")]
    Remote { status: u16, message: String },
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
