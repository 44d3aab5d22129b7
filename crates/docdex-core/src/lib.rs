//! docdex Core - document index-tree rebuild kernel
//!
//! This crate provides the data structures and operations for docdex,
//! including:
//! - Template tree and instance tree models with arena storage
//! - A closed, allow-listed expression language evaluated against
//!   per-document contexts
//! - The reconciler: compute desired paths, diff, mutate, prune
//! - Metadata types with validated/restricted values and per-document-type
//!   defaults
//! - Snapshot manifest generation with deterministic digests
//! - Rendering capabilities for Markdown export
//!
//! The kernel is single-threaded: all mutation goes through
//! `&mut IndexState`. Serialization of concurrent callers is the
//! responsibility of `docdex-engine`.

pub mod errors;
pub mod eval;
pub mod events;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod render;
pub mod rules;
pub mod snapshot;

// Re-export commonly used types
pub use errors::{IndexError, Result};
pub use events::{AuditEvent, EventSink, NoopEventSink, VecEventSink};
pub use model::{
    DocumentContext, DocumentRecord, DocumentTypeBinding, InstanceNode, MetadataType,
    TemplateNode, TemplateTree,
};
pub use ops::{
    reindex, reindex_with_cancel, remove_document, CancelToken, DocumentStore, IndexState,
    MetadataRegistry, ReindexResult,
};
