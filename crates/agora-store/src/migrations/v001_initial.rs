//! v001 -- Initial schema creation.
//!
//! A single `documents` table holds every collection. `seq` preserves
//! insertion order, which is the order `get_all` returns documents in; an
//! upsert keeps the original `seq`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    data       TEXT NOT NULL,               -- JSON object
    created_at TEXT NOT NULL,               -- RFC-3339
    updated_at TEXT NOT NULL,               -- RFC-3339

    UNIQUE (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection_seq
    ON documents(collection, seq);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
