use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MetadataType - a typed, validated key-value attribute definition
///
/// `lookup` is interpreted two ways, matching the fixed registries in
/// [`crate::eval::registry`]:
/// - the name of an allow-listed validator: raw input is passed through it
///   and replaced when the validator returns a non-empty transform;
/// - otherwise a restricted choice-set expression evaluated against the
///   model registry: the value must be a member of the resolved set.
///
/// `default` is an expression over the allow-listed function registry,
/// evaluated only when no raw input is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataType {
    /// Internal name, unique across the registry
    pub name: String,

    /// Optional display label; falls back to `name`
    pub label: Option<String>,

    /// Validator name or restricted choice-set expression
    pub lookup: Option<String>,

    /// Default-value expression over the function registry
    pub default: Option<String>,

    /// Timestamp when this type was created
    pub created_at: DateTime<Utc>,
}

impl MetadataType {
    /// Create a plain metadata type with no lookup and no default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            lookup: None,
            default: None,
            created_at: Utc::now(),
        }
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the lookup (validator name or choice-set expression)
    pub fn with_lookup(mut self, lookup: impl Into<String>) -> Self {
        self.lookup = Some(lookup.into());
        self
    }

    /// Set the default-value expression
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Display label, falling back to the internal name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// DocumentTypeBinding - attaches a metadata type to a document type
///
/// Bindings are referenced (never copied) by per-document metadata values;
/// a metadata type cannot be deleted while a binding references it. A
/// binding may carry its own default expression, which takes precedence
/// over the metadata type's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTypeBinding {
    /// Document type name
    pub document_type: String,

    /// Bound metadata type name
    pub metadata_type: String,

    /// Required bindings must resolve to a value (raw or default)
    pub required: bool,

    /// Binding-level default expression, overriding the type default
    pub default: Option<String>,
}

impl DocumentTypeBinding {
    pub fn new(
        document_type: impl Into<String>,
        metadata_type: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            document_type: document_type.into(),
            metadata_type: metadata_type.into(),
            required,
            default: None,
        }
    }

    /// Set the binding-level default expression
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}
