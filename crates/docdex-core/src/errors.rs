use thiserror::Error;

/// Result type alias using IndexError
pub type Result<T> = std::result::Result<T, IndexError>;

/// Canonical error type for the indexing kernel
///
/// Every variant carries the identifiers needed to report the failure
/// without additional lookups. Variants map to stable error codes via
/// [`IndexError::code`] for programmatic handling and log correlation.
#[derive(Debug, Error)]
pub enum IndexError {
    // ===== Expression evaluation =====
    /// Expression failed to parse, referenced a missing binding, or called
    /// a function outside the allow-list
    #[error("Evaluation of `{expression}` failed: {cause}")]
    Evaluation { expression: String, cause: String },

    /// Root-level evaluation failure: the whole reindex pass for this
    /// document was aborted with no tree mutation applied
    #[error("Reindex of document {document_id} in index {index_id} failed: {cause}")]
    Reindex {
        document_id: String,
        index_id: String,
        #[source]
        cause: Box<IndexError>,
    },

    // ===== Metadata values =====
    /// Value is not a member of the restricted choice set
    #[error("Value `{value}` for field {field} is not one of the allowed choices")]
    InvalidChoice { field: String, value: String },

    /// A required metadata binding resolved to no value
    #[error("Field {field} is required for document type {document_type}")]
    RequiredValueMissing {
        field: String,
        document_type: String,
    },

    /// Metadata type not registered
    #[error("Metadata type not found: {name}")]
    MetadataTypeNotFound { name: String },

    /// Metadata type still referenced by document-type bindings
    #[error("Metadata type {name} is referenced by {binding_count} binding(s) and cannot be deleted")]
    MetadataTypeInUse { name: String, binding_count: usize },

    // ===== Tree structure =====
    /// Instance node not found in the arena
    #[error("Instance node not found: {node_id}")]
    NodeNotFound { node_id: String },

    /// Node still holds documents or children and cannot be removed
    #[error("Instance node {node_id} is not empty")]
    NodeNotEmpty { node_id: String },

    /// Template node not found in the template tree
    #[error("Template node not found: {template_id}")]
    TemplateNotFound { template_id: String },

    /// Index not registered
    #[error("Index not found: {index_id}")]
    IndexNotFound { index_id: String },

    /// Document not found in the document store
    #[error("Document not found: {document_id}")]
    DocumentNotFound { document_id: String },

    /// Structural invariant violated (duplicate sibling value, broken
    /// parent pointer, stale reverse index)
    #[error("Invariant violation in index {index_id}: {reason}")]
    InvariantViolation { index_id: String, reason: String },

    // ===== Concurrency =====
    /// Writer lock for the index could not be acquired within the retry
    /// budget; retryable
    #[error("Concurrent modification of index {index_id}: lock acquisition timed out")]
    ConcurrentModification { index_id: String },

    /// Reindex pass was cancelled before commit
    #[error("Reindex of document {document_id} in index {index_id} was cancelled")]
    Cancelled {
        document_id: String,
        index_id: String,
    },

    // ===== Integration =====
    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Seed file failed validation
    #[error("Invalid seed: {reason}")]
    InvalidSeed { reason: String },
}

impl IndexError {
    /// Get the stable error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::Evaluation { .. } => "ERR_EVALUATION",
            IndexError::Reindex { .. } => "ERR_REINDEX",
            IndexError::InvalidChoice { .. } => "ERR_INVALID_CHOICE",
            IndexError::RequiredValueMissing { .. } => "ERR_REQUIRED_VALUE_MISSING",
            IndexError::MetadataTypeNotFound { .. } => "ERR_METADATA_TYPE_NOT_FOUND",
            IndexError::MetadataTypeInUse { .. } => "ERR_METADATA_TYPE_IN_USE",
            IndexError::NodeNotFound { .. } => "ERR_NODE_NOT_FOUND",
            IndexError::NodeNotEmpty { .. } => "ERR_NODE_NOT_EMPTY",
            IndexError::TemplateNotFound { .. } => "ERR_TEMPLATE_NOT_FOUND",
            IndexError::IndexNotFound { .. } => "ERR_INDEX_NOT_FOUND",
            IndexError::DocumentNotFound { .. } => "ERR_DOCUMENT_NOT_FOUND",
            IndexError::InvariantViolation { .. } => "ERR_INVARIANT_VIOLATION",
            IndexError::ConcurrentModification { .. } => "ERR_CONCURRENT_MODIFICATION",
            IndexError::Cancelled { .. } => "ERR_CANCELLED",
            IndexError::Serialization(_) => "ERR_SERIALIZATION",
            IndexError::InvalidSeed { .. } => "ERR_INVALID_SEED",
        }
    }

    /// Whether the caller may retry the failed operation
    ///
    /// Only lock-contention failures are transient. Evaluation and choice
    /// errors are data problems and retrying cannot fix them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IndexError::ConcurrentModification { .. })
    }
}
