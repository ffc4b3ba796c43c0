//! In-process [`DocumentStore`] over a SQLite [`Database`].

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::ops::{Document, FieldOp, WriteBatch};
use crate::store::DocumentStore;

/// Shared handle to one SQLite connection.
///
/// Every call runs to completion under the connection lock, which is what
/// makes field operations and batches atomic with respect to each other.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open the default platform database.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Database::new()?))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn with_db<T>(&self, f: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        let mut guard = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut guard)
    }
}

impl DocumentStore for LocalStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.with_db(|db| db.list_documents(collection))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.with_db(|db| db.get_document(collection, id))
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        let id = self.with_db(|db| db.insert_document(collection, &data))?;
        tracing::debug!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        self.with_db(|db| db.merge_document(collection, id, &fields))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        self.with_db(|db| db.put_document(collection, id, &data))
    }

    async fn apply(&self, collection: &str, id: &str, op: FieldOp) -> Result<()> {
        self.with_db(|db| db.apply_field_op(collection, id, &op))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<String>> {
        self.with_db(|db| db.commit_batch(&batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn crud_through_the_contract() {
        let store = LocalStore::in_memory().unwrap();

        let id = store
            .create("posts", json!({ "content": "hello", "likes": [] }))
            .await
            .unwrap();
        store
            .update("posts", &id, json!({ "content": "edited" }))
            .await
            .unwrap();

        let all = store.get_all("posts").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].data["content"], "edited");
        assert!(store.get("posts", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_likes_are_not_lost() {
        let store = Arc::new(LocalStore::in_memory().unwrap());
        let id = store.create("posts", json!({ "likes": [] })).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..16 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .apply(
                        "posts",
                        &id,
                        FieldOp::ArrayUnion {
                            field: "likes".into(),
                            value: json!(format!("user-{n}")),
                        },
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let doc = store.get("posts", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["likes"].as_array().unwrap().len(), 16);
    }

    #[tokio::test]
    async fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agora.db");

        let id = {
            let store = LocalStore::open_at(&path).unwrap();
            store.create("posts", json!({ "content": "kept" })).await.unwrap()
        };

        let store = LocalStore::open_at(&path).unwrap();
        let doc = store.get("posts", &id).await.unwrap().unwrap();
        assert_eq!(doc.data["content"], "kept");
    }
}
