//! Canonical schema constants for structured logging and audit events
//!
//! These constants ensure consistency across all logging, error reporting,
//! and outbound audit events.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Entity identifiers
pub const FIELD_DOCUMENT_ID: &str = "document_id";
pub const FIELD_INDEX_ID: &str = "index_id";
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_TEMPLATE_ID: &str = "template_id";
pub const FIELD_VALUE: &str = "value";
pub const FIELD_EXPRESSION: &str = "expression";

// Collection sizes
pub const FIELD_PATH_COUNT: &str = "path_count";
pub const FIELD_NODES_ADDED: &str = "nodes_added";
pub const FIELD_NODES_REMOVED: &str = "nodes_removed";

// Error fields
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names for operation logging
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical audit event names (outbound surface)
pub const AUDIT_NODE_CREATED: &str = "node_created";
pub const AUDIT_NODE_REMOVED: &str = "node_removed";
pub const AUDIT_DOCUMENT_ATTACHED: &str = "document_attached";
pub const AUDIT_DOCUMENT_DETACHED: &str = "document_detached";
pub const AUDIT_DOCUMENT_RENAMED: &str = "document_renamed";
