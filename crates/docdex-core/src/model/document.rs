use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// DocumentRecord - the stored form of a document known to the indexer
///
/// Only the attributes the evaluator can see live here; file content,
/// versions and storage concerns belong to external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier
    pub id: String,

    /// Document type name (drives metadata defaults)
    pub document_type: String,

    /// Human-readable label
    pub label: String,

    /// Metadata values keyed by metadata type name. Arrays model
    /// multi-valued fields and fan out during evaluation.
    pub metadata: HashMap<String, Value>,

    /// Timestamp when the document entered the system
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a new record with empty metadata
    pub fn new(
        id: impl Into<String>,
        document_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            document_type: document_type.into(),
            label: label.into(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Set a metadata value, returning self for chained construction
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// DocumentContext - the read-only evaluation snapshot of one document
///
/// Built once before reconciliation begins; the evaluator performs no I/O.
/// Expressions see two roots: `document` (intrinsic properties) and
/// `metadata` (typed attribute values).
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub document_id: String,
    properties: HashMap<String, Value>,
    metadata: HashMap<String, Value>,
}

impl DocumentContext {
    /// Create an empty context for the given document
    pub fn new(document_id: impl Into<String>) -> Self {
        let document_id = document_id.into();
        let mut properties = HashMap::new();
        properties.insert("id".to_string(), Value::String(document_id.clone()));
        Self {
            document_id,
            properties,
            metadata: HashMap::new(),
        }
    }

    /// Build a context from a stored record
    pub fn from_record(record: &DocumentRecord) -> Self {
        let mut ctx = Self::new(record.id.clone());
        ctx.properties
            .insert("label".to_string(), Value::String(record.label.clone()));
        ctx.properties.insert(
            "document_type".to_string(),
            Value::String(record.document_type.clone()),
        );
        ctx.properties.insert(
            "created".to_string(),
            Value::String(record.created_at.to_rfc3339()),
        );
        for (key, value) in &record.metadata {
            ctx.metadata.insert(key.clone(), value.clone());
        }
        ctx
    }

    /// Set an intrinsic property, returning self for chained construction
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set a metadata binding, returning self for chained construction
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Look up an intrinsic property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Look up a metadata binding
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_from_record() {
        let record = DocumentRecord::new("doc-1", "invoice", "Invoice 42")
            .with_metadata("year", "2020")
            .with_metadata("tags", json!(["a", "b"]));

        let ctx = DocumentContext::from_record(&record);

        assert_eq!(ctx.document_id, "doc-1");
        assert_eq!(ctx.property("label"), Some(&json!("Invoice 42")));
        assert_eq!(ctx.property("document_type"), Some(&json!("invoice")));
        assert_eq!(ctx.metadata("year"), Some(&json!("2020")));
        assert_eq!(ctx.metadata("tags"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_builder_context() {
        let ctx = DocumentContext::new("doc-1")
            .with_property("label", "A")
            .with_metadata("year", "2020");

        assert_eq!(ctx.property("id"), Some(&json!("doc-1")));
        assert_eq!(ctx.property("label"), Some(&json!("A")));
        assert_eq!(ctx.metadata("year"), Some(&json!("2020")));
        assert!(ctx.metadata("missing").is_none());
    }
}
