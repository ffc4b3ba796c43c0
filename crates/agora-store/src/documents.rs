use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::ops::{ensure_object, validate_collection, validate_id, Document, FieldOp, WriteBatch, WriteOp};

impl Database {
    /// Every document of a collection, in insertion order.
    pub fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        validate_collection(collection)?;

        let mut stmt = self.conn().prepare(
            "SELECT id, data FROM documents WHERE collection = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            let id: String = row.get(0)?;
            let data: String = row.get(1)?;
            Ok((id, data))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, data) = row?;
            documents.push(Document {
                id,
                data: serde_json::from_str(&data)?,
            });
        }
        Ok(documents)
    }

    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        validate_collection(collection)?;
        validate_id(id)?;
        read(self.conn(), collection, id)
    }

    /// Insert a new document under a fresh v4 id and return that id.
    pub fn insert_document(&self, collection: &str, data: &Value) -> Result<String> {
        insert(self.conn(), collection, data)
    }

    /// Shallow-merge `fields` into an existing document.
    pub fn merge_document(&mut self, collection: &str, id: &str, fields: &Value) -> Result<()> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        merge(&tx, collection, id, fields)?;
        tx.commit()?;
        Ok(())
    }

    /// Create or wholly replace a document.
    pub fn put_document(&self, collection: &str, id: &str, data: &Value) -> Result<()> {
        upsert(self.conn(), collection, id, data)
    }

    /// Apply an atomic array operation to one field of an existing document.
    pub fn apply_field_op(&mut self, collection: &str, id: &str, op: &FieldOp) -> Result<()> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        apply(&tx, collection, id, op)?;
        tx.commit()?;
        Ok(())
    }

    /// Commit every write of the batch in one transaction.
    ///
    /// Returns one id per write: the generated id for creates, the addressed
    /// id otherwise. If any write fails nothing is persisted.
    pub fn commit_batch(&mut self, batch: &WriteBatch) -> Result<Vec<String>> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut ids = Vec::with_capacity(batch.len());
        for write in &batch.writes {
            let id = match write {
                WriteOp::Create { collection, data } => insert(&tx, collection, data)?,
                WriteOp::Set {
                    collection,
                    id,
                    data,
                } => {
                    upsert(&tx, collection, id, data)?;
                    id.clone()
                }
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                } => {
                    merge(&tx, collection, id, fields)?;
                    id.clone()
                }
                WriteOp::Apply { collection, id, op } => {
                    apply(&tx, collection, id, op)?;
                    id.clone()
                }
            };
            ids.push(id);
        }

        tx.commit()?;
        tracing::debug!(writes = ids.len(), "batch committed");
        Ok(ids)
    }
}

fn read(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;

    match data {
        Some(data) => Ok(Some(Document {
            id: id.to_string(),
            data: serde_json::from_str(&data)?,
        })),
        None => Ok(None),
    }
}

fn insert(conn: &Connection, collection: &str, data: &Value) -> Result<String> {
    validate_collection(collection)?;
    ensure_object(data)?;

    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (collection, id, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![collection, id, serde_json::to_string(data)?, now],
    )?;
    Ok(id)
}

fn upsert(conn: &Connection, collection: &str, id: &str, data: &Value) -> Result<()> {
    validate_collection(collection)?;
    validate_id(id)?;
    ensure_object(data)?;

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (collection, id, data, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT (collection, id)
         DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![collection, id, serde_json::to_string(data)?, now],
    )?;
    Ok(())
}

fn overwrite(conn: &Connection, collection: &str, id: &str, data: &Value) -> Result<()> {
    let affected = conn.execute(
        "UPDATE documents SET data = ?3, updated_at = ?4 WHERE collection = ?1 AND id = ?2",
        params![collection, id, serde_json::to_string(data)?, Utc::now().to_rfc3339()],
    )?;
    if affected == 0 {
        return Err(StoreError::not_found(collection, id));
    }
    Ok(())
}

fn merge(conn: &Connection, collection: &str, id: &str, fields: &Value) -> Result<()> {
    validate_collection(collection)?;
    validate_id(id)?;
    let fields = fields.as_object().ok_or(StoreError::NotAnObject)?;

    let mut doc = read(conn, collection, id)?.ok_or_else(|| StoreError::not_found(collection, id))?;
    let target = doc.data.as_object_mut().ok_or(StoreError::NotAnObject)?;
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
    overwrite(conn, collection, id, &doc.data)
}

fn apply(conn: &Connection, collection: &str, id: &str, op: &FieldOp) -> Result<()> {
    validate_collection(collection)?;
    validate_id(id)?;

    let mut doc = read(conn, collection, id)?.ok_or_else(|| StoreError::not_found(collection, id))?;
    op.apply_to(&mut doc.data)?;
    overwrite(conn, collection, id, &doc.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn list_preserves_insertion_order_across_upserts() {
        let db = db();
        let a = db.insert_document("posts", &json!({ "n": 1 })).unwrap();
        let b = db.insert_document("posts", &json!({ "n": 2 })).unwrap();
        db.put_document("posts", &a, &json!({ "n": 10 })).unwrap();
        db.insert_document("other", &json!({ "n": 3 })).unwrap();

        let docs = db.list_documents("posts").unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, [a, b]);
        assert_eq!(docs[0].data, json!({ "n": 10 }));
    }

    #[test]
    fn merge_replaces_only_named_fields() {
        let mut db = db();
        let id = db
            .insert_document("posts", &json!({ "content": "hi", "likes": [] }))
            .unwrap();
        db.merge_document("posts", &id, &json!({ "likes": ["u1"] }))
            .unwrap();

        let doc = db.get_document("posts", &id).unwrap().unwrap();
        assert_eq!(doc.data, json!({ "content": "hi", "likes": ["u1"] }));
    }

    #[test]
    fn merge_missing_document_is_not_found() {
        let mut db = db();
        let err = db
            .merge_document("posts", "nope", &json!({ "a": 1 }))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn put_creates_lazily() {
        let db = db();
        assert!(db.get_document("userProfiles", "u1").unwrap().is_none());
        db.put_document("userProfiles", "u1", &json!({ "bio": "x" }))
            .unwrap();
        assert_eq!(
            db.get_document("userProfiles", "u1").unwrap().unwrap().data,
            json!({ "bio": "x" })
        );
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        let db = db();
        assert!(matches!(
            db.insert_document("posts", &json!([1, 2])),
            Err(StoreError::NotAnObject)
        ));
    }

    #[test]
    fn field_ops_persist() {
        let mut db = db();
        let id = db.insert_document("posts", &json!({ "likes": [] })).unwrap();
        for user in ["u1", "u2", "u1"] {
            db.apply_field_op(
                "posts",
                &id,
                &FieldOp::ArrayUnion {
                    field: "likes".into(),
                    value: json!(user),
                },
            )
            .unwrap();
        }
        let doc = db.get_document("posts", &id).unwrap().unwrap();
        assert_eq!(doc.data["likes"], json!(["u1", "u2"]));
    }

    #[test]
    fn failed_batch_persists_nothing() {
        let mut db = db();
        let batch = WriteBatch::new()
            .create("posts", json!({ "content": "a" }))
            .update("posts", "missing", json!({ "x": 1 }));

        assert!(db.commit_batch(&batch).is_err());
        assert!(db.list_documents("posts").unwrap().is_empty());
    }

    #[test]
    fn batch_returns_ids_in_order() {
        let mut db = db();
        let batch = WriteBatch::new()
            .create("posts", json!({ "content": "a" }))
            .set("authors", "u1", json!({ "userName": "Ada" }));

        let ids = db.commit_batch(&batch).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], "u1");
        assert!(db.get_document("posts", &ids[0]).unwrap().is_some());
        assert!(db.get_document("authors", "u1").unwrap().is_some());
    }
}
