//! The document store contract.
//!
//! Every Agora view talks to persistence through this trait only. It is
//! implemented in-process by [`LocalStore`](crate::LocalStore) and over HTTP
//! by the client's `RemoteStore`.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::ops::{Document, FieldOp, WriteBatch};

pub trait DocumentStore: Send + Sync {
    /// Every document of `collection`, in store order.
    fn get_all(&self, collection: &str) -> impl Future<Output = Result<Vec<Document>>> + Send;

    fn get(&self, collection: &str, id: &str)
        -> impl Future<Output = Result<Option<Document>>> + Send;

    /// Store a new record and return its generated id.
    fn create(&self, collection: &str, data: Value) -> impl Future<Output = Result<String>> + Send;

    /// Shallow-merge top-level `fields` into an existing document.
    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Create or wholly replace the document at `id`.
    fn set(&self, collection: &str, id: &str, data: Value)
        -> impl Future<Output = Result<()>> + Send;

    /// Apply an atomic array operation to one field of an existing document.
    fn apply(&self, collection: &str, id: &str, op: FieldOp)
        -> impl Future<Output = Result<()>> + Send;

    /// Commit several writes atomically.
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = Result<Vec<String>>> + Send;
}

impl<S: DocumentStore> DocumentStore for Arc<S> {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
        (**self).get_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        (**self).get(collection, id).await
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        (**self).create(collection, data).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        (**self).update(collection, id, fields).await
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        (**self).set(collection, id, data).await
    }

    async fn apply(&self, collection: &str, id: &str, op: FieldOp) -> Result<()> {
        (**self).apply(collection, id, op).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<String>> {
        (**self).commit(batch).await
    }
}
