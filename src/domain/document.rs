//! Schema-less document entity

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record in a document collection.
///
/// Documents carry no fixed schema: beyond the numeric id every field is
/// an arbitrary JSON value, so one gateway serves any resource kind without
/// per-resource codegen. The id is allocated by the entity store at insert
/// time and is never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates a document from an allocated id and its field payload
    pub fn new(id: i64, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Returns the value of a field, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
