//! Test doubles shared by the view tests.

use std::sync::atomic::{AtomicBool, Ordering};

use agora_shared::session::Credentials;
use agora_shared::Session;
use agora_store::{Document, DocumentStore, FieldOp, LocalStore, Result, StoreError, WriteBatch};
use serde_json::Value;

pub fn session(email: &str) -> Session {
    Credentials {
        email: email.into(),
        display_name: Some(email.split('@').next().unwrap_or("user").into()),
        photo_ref: None,
    }
    .into_session()
    .unwrap()
}

fn unavailable() -> StoreError {
    StoreError::Transport("store unavailable".into())
}

/// A store whose every call fails.
pub struct FailingStore;

impl DocumentStore for FailingStore {
    async fn get_all(&self, _: &str) -> Result<Vec<Document>> {
        Err(unavailable())
    }

    async fn get(&self, _: &str, _: &str) -> Result<Option<Document>> {
        Err(unavailable())
    }

    async fn create(&self, _: &str, _: Value) -> Result<String> {
        Err(unavailable())
    }

    async fn update(&self, _: &str, _: &str, _: Value) -> Result<()> {
        Err(unavailable())
    }

    async fn set(&self, _: &str, _: &str, _: Value) -> Result<()> {
        Err(unavailable())
    }

    async fn apply(&self, _: &str, _: &str, _: FieldOp) -> Result<()> {
        Err(unavailable())
    }

    async fn commit(&self, _: WriteBatch) -> Result<Vec<String>> {
        Err(unavailable())
    }
}

/// Delegates to a [`LocalStore`], except that the first `commit` never
/// completes.
pub struct StallFirstCommit {
    inner: LocalStore,
    stalled: AtomicBool,
}

impl StallFirstCommit {
    pub fn new(inner: LocalStore) -> Self {
        Self {
            inner,
            stalled: AtomicBool::new(false),
        }
    }
}

impl DocumentStore for StallFirstCommit {
    async fn get_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.inner.get_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn create(&self, collection: &str, data: Value) -> Result<String> {
        self.inner.create(collection, data).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> Result<()> {
        self.inner.update(collection, id, fields).await
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        self.inner.set(collection, id, data).await
    }

    async fn apply(&self, collection: &str, id: &str, op: FieldOp) -> Result<()> {
        self.inner.apply(collection, id, op).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<Vec<String>> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.commit(batch).await
    }
}
