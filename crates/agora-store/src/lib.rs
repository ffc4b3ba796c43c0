//! # agora-store
//!
//! Schemaless document storage for Agora, backed by SQLite.
//!
//! Records are JSON objects grouped into named collections. The crate exposes
//! a synchronous [`Database`] handle with typed document helpers, the async
//! [`DocumentStore`] contract every Agora view is written against, and
//! [`LocalStore`], the in-process implementation of that contract.

pub mod database;
pub mod documents;
pub mod local;
pub mod migrations;
pub mod ops;
pub mod store;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use local::LocalStore;
pub use ops::{Document, FieldOp, WriteBatch, WriteOp};
pub use store::DocumentStore;
