use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A bond craft essence resolved during this run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    /// Bond CE collection number.
    pub id: u32,
    /// Display name of the owning servant.
    pub owner: String,
    /// Servant face image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    /// Collection number of the same servant's valentine chocolate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choco_id: Option<u32>,
}

impl CatalogRecord {
    pub fn new(id: u32, owner: impl Into<String>) -> Self {
        Self {
            id,
            owner: owner.into(),
            face: None,
            choco_id: None,
        }
    }

    pub fn with_face(mut self, face: Option<String>) -> Self {
        self.face = face;
        self
    }

    pub fn with_choco_id(mut self, choco_id: Option<u32>) -> Self {
        self.choco_id = choco_id;
        self
    }
}

/// A catalog entry as it sits in the store.
///
/// Only `id` is interpreted; every other field, nulls and key order included,
/// is written back exactly as it was read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct StoredRecord {
    id: u32,
    fields: Map<String, Value>,
}

impl StoredRecord {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Owner display name, if the entry has a string one.
    pub fn owner(&self) -> Option<&str> {
        self.get("owner").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for StoredRecord {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = fields
            .get("id")
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .ok_or_else(|| format!("record without a valid integer id: {:?}", fields.get("id")))?;
        Ok(Self { id, fields })
    }
}

impl From<StoredRecord> for Map<String, Value> {
    fn from(record: StoredRecord) -> Self {
        record.fields
    }
}

impl From<CatalogRecord> for StoredRecord {
    fn from(record: CatalogRecord) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(record.id));
        fields.insert("owner".to_string(), Value::from(record.owner));
        if let Some(face) = record.face {
            fields.insert("face".to_string(), Value::from(face));
        }
        if let Some(choco_id) = record.choco_id {
            fields.insert("choco_id".to_string(), Value::from(choco_id));
        }
        Self {
            id: record.id,
            fields,
        }
    }
}

/// Loaded catalog plus the lookups derived from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    /// Records in discovery order.
    pub records: Vec<StoredRecord>,
    pub known_ids: HashSet<u32>,
    /// Highest id recorded so far, 0 for an empty catalog.
    pub watermark: u32,
}

impl CatalogSnapshot {
    pub fn from_records(records: Vec<StoredRecord>) -> Self {
        let known_ids = records.iter().map(StoredRecord::id).collect();
        let watermark = records.iter().map(StoredRecord::id).max().unwrap_or(0);
        Self {
            records,
            known_ids,
            watermark,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append newly discovered records, keeping the derived lookups current.
    pub fn append(&mut self, new_records: impl IntoIterator<Item = CatalogRecord>) {
        for record in new_records {
            self.known_ids.insert(record.id);
            self.watermark = self.watermark.max(record.id);
            self.records.push(record.into());
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to access catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog {path} is not valid JSON: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}
