pub mod document_store;
pub mod reconciler;
pub mod resolver;
pub mod store;

pub use document_store::DocumentStore;
pub use reconciler::{
    reindex, reindex_with_cancel, remove_document, CancelToken, ReindexResult,
};
pub use resolver::MetadataRegistry;
pub use store::IndexState;
