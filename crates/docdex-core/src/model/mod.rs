pub mod document;
pub mod instance;
pub mod metadata;
pub mod template;

pub use document::{DocumentContext, DocumentRecord};
pub use instance::InstanceNode;
pub use metadata::{DocumentTypeBinding, MetadataType};
pub use template::{TemplateNode, TemplateTree};
