//! Line codec for the memory file.
//!
//! Each record is one JSON object on its own line, tagged with its kind:
//!
//! ```text
//! {"type":"entity","name":"Alice","entityType":"Person","observations":["Likes coding"]}
//! {"type":"relation","from":"Alice","to":"Bob","relationType":"knows"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, StoreError};
use crate::graph::{Entity, Relation};

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Entity(Entity),
    Relation(Relation),
}

impl From<Entity> for Record {
    fn from(e: Entity) -> Self {
        Record::Entity(e)
    }
}

impl From<Relation> for Record {
    fn from(r: Relation) -> Self {
        Record::Relation(r)
    }
}

/// Encode a record as a single line (no trailing newline).
pub fn encode(record: &Record) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(|e| StoreError::Serialization {
        message: format!("failed to encode record: {e}"),
    })
}

/// Encode an entity without cloning it into a [`Record`].
pub fn encode_entity(entity: &Entity) -> Result<String, StoreError> {
    encode_tagged("entity", entity)
}

/// Encode a relation without cloning it into a [`Record`].
pub fn encode_relation(relation: &Relation) -> Result<String, StoreError> {
    encode_tagged("relation", relation)
}

/// Decode one line. `line` is 1-based and only used for diagnostics.
pub fn decode(line: usize, text: &str) -> Result<Record, CodecError> {
    serde_json::from_str(text).map_err(|e| CodecError::MalformedRecord {
        line,
        message: e.to_string(),
    })
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    inner: &'a T,
}

fn encode_tagged<T: Serialize>(kind: &'static str, inner: &T) -> Result<String, StoreError> {
    serde_json::to_string(&Tagged { kind, inner }).map_err(|e| StoreError::Serialization {
        message: format!("failed to encode {kind} record: {e}"),
    })
}
