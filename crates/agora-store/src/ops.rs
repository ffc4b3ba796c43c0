//! Wire types of the document store contract: documents, atomic field
//! operations and write batches.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Maximum length of a collection name.
pub const MAX_COLLECTION_LEN: usize = 64;

/// Maximum length of a document id.
pub const MAX_ID_LEN: usize = 128;

/// A stored record together with its id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// An atomic mutation of one top-level array field.
///
/// The store resolves these server-side, so concurrent writers never lose
/// each other's change the way a client-computed full-array overwrite does.
/// A missing or `null` field counts as an empty array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FieldOp {
    /// Add `value` unless an equal element is already present.
    ArrayUnion { field: String, value: Value },
    /// Remove every element equal to `value`.
    ArrayRemove { field: String, value: Value },
    /// Push `value` to the end, duplicates allowed.
    Append { field: String, value: Value },
}

impl FieldOp {
    pub fn field(&self) -> &str {
        match self {
            Self::ArrayUnion { field, .. }
            | Self::ArrayRemove { field, .. }
            | Self::Append { field, .. } => field,
        }
    }

    /// Apply the operation to a document body in place.
    pub fn apply_to(&self, data: &mut Value) -> Result<()> {
        let object = data.as_object_mut().ok_or(StoreError::NotAnObject)?;
        let slot = object
            .entry(self.field().to_string())
            .or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        let array = slot.as_array_mut().ok_or_else(|| StoreError::FieldType {
            field: self.field().to_string(),
        })?;

        match self {
            Self::ArrayUnion { value, .. } => {
                if !array.contains(value) {
                    array.push(value.clone());
                }
            }
            Self::ArrayRemove { value, .. } => array.retain(|v| v != value),
            Self::Append { value, .. } => array.push(value.clone()),
        }
        Ok(())
    }
}

/// One write inside a [`WriteBatch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WriteOp {
    Create {
        collection: String,
        data: Value,
    },
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    Update {
        collection: String,
        id: String,
        fields: Value,
    },
    Apply {
        collection: String,
        id: String,
        op: FieldOp,
    },
}

/// Writes committed together: either all of them land or none do.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WriteBatch {
    pub writes: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, collection: &str, data: Value) -> Self {
        self.writes.push(WriteOp::Create {
            collection: collection.to_string(),
            data,
        });
        self
    }

    pub fn set(mut self, collection: &str, id: &str, data: Value) -> Self {
        self.writes.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        });
        self
    }

    pub fn update(mut self, collection: &str, id: &str, fields: Value) -> Self {
        self.writes.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn apply(mut self, collection: &str, id: &str, op: FieldOp) -> Self {
        self.writes.push(WriteOp::Apply {
            collection: collection.to_string(),
            id: id.to_string(),
            op,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Collection names are `[A-Za-z0-9_-]{1,64}`.
pub fn validate_collection(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name.len() <= MAX_COLLECTION_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(format!("collection '{name}'")))
    }
}

/// Document ids are non-empty, at most 128 chars and contain no `/`.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN || id.contains('/') || id.trim() != id {
        return Err(StoreError::InvalidName(format!("document id '{id}'")));
    }
    Ok(())
}

pub(crate) fn ensure_object(data: &Value) -> Result<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(StoreError::NotAnObject)
    }
}
