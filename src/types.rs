//! Core types for live bindings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A document delivered by the store.
///
/// Documents are opaque key-value maps with a required `id`. No schema is
/// enforced here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,

    /// Remaining top-level fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Build a document from a JSON object. Any `id` key inside `value` is
    /// ignored in favour of `id`.
    pub fn from_json(id: impl Into<String>, value: Value) -> Self {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.remove("id");
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Add a field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a top-level field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Address of a single document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentKey {
    pub collection: String,
    pub id: String,
}

impl DocumentKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentKey({}/{})", self.collection, self.id)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Per-binding counter, bumped every time the active listener is replaced
/// or torn down.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen({})", self.0)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned listener identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_roundtrip_keeps_id_flat() {
        let doc = Document::new("a").with("title", "Bike").with("price", 120);
        let encoded = serde_json::to_value(&doc).unwrap();
        assert_eq!(encoded, json!({"id": "a", "title": "Bike", "price": 120}));

        let decoded: Document = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_document_from_json_drops_inner_id() {
        let doc = Document::from_json("x", json!({"id": "y", "city": "Lagos"}));
        assert_eq!(doc.id, "x");
        assert!(doc.get("id").is_none());
        assert_eq!(doc.get("city"), Some(&json!("Lagos")));
    }

    #[test]
    fn test_generation_next() {
        assert_eq!(Generation(0).next(), Generation(1));
        assert!(Generation(3) > Generation(2));
    }
}
