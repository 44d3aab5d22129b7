//! JSON seed fixtures
//!
//! A seed file describes a document population and the template trees of
//! one or more indexes. Seeds back the CLI and integration tests:
//!
//! ```json
//! {
//!   "documents": [
//!     {"id": "d1", "document_type": "invoice", "label": "Invoice 42",
//!      "metadata": {"year": "2020", "category": "invoice"}}
//!   ],
//!   "indexes": [
//!     {"id": "by-year", "templates": [
//!       {"expression": "metadata.year",
//!        "children": [{"expression": "metadata.category"}]}
//!     ]}
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use docdex_core::errors::{IndexError, Result};
use docdex_core::model::{DocumentRecord, TemplateNode, TemplateTree};
use docdex_core::ops::{DocumentStore, ReindexResult};

use crate::registry::IndexRegistry;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub documents: Vec<SeedDocument>,
    #[serde(default)]
    pub indexes: Vec<SeedIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDocument {
    pub id: String,
    pub document_type: String,
    pub label: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedIndex {
    pub id: String,
    pub templates: Vec<SeedTemplateNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedTemplateNode {
    pub expression: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub link_documents: bool,
    #[serde(default)]
    pub children: Vec<SeedTemplateNode>,
}

/// Outcome of loading a seed into a registry
#[derive(Debug, Default)]
pub struct SeedSummary {
    /// Number of documents loaded into the store
    pub documents: usize,
    /// Number of indexes registered
    pub indexes: usize,
    /// Aggregated reconciliation result per index
    pub results: BTreeMap<String, ReindexResult>,
    /// Per-document root failures, as (index_id, error) pairs
    pub failures: Vec<(String, IndexError)>,
}

/// Parse and validate a seed file
///
/// # Errors
/// * `Serialization` - malformed JSON
/// * `InvalidSeed` - empty IDs/expressions or duplicate document/index IDs
pub fn parse_seed(json: &str) -> Result<SeedFile> {
    let seed: SeedFile = serde_json::from_str(json)?;

    let mut doc_ids = HashSet::new();
    for doc in &seed.documents {
        if doc.id.trim().is_empty() {
            return Err(invalid("document with empty id"));
        }
        if !doc_ids.insert(doc.id.as_str()) {
            return Err(invalid(format!("duplicate document id `{}`", doc.id)));
        }
    }

    let mut index_ids = HashSet::new();
    for index in &seed.indexes {
        if index.id.trim().is_empty() {
            return Err(invalid("index with empty id"));
        }
        if !index_ids.insert(index.id.as_str()) {
            return Err(invalid(format!("duplicate index id `{}`", index.id)));
        }
        validate_templates(&index.id, &index.templates)?;
    }

    Ok(seed)
}

fn validate_templates(index_id: &str, nodes: &[SeedTemplateNode]) -> Result<()> {
    for node in nodes {
        if node.expression.trim().is_empty() {
            return Err(invalid(format!(
                "index `{}` has a template node with an empty expression",
                index_id
            )));
        }
        validate_templates(index_id, &node.children)?;
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> IndexError {
    IndexError::InvalidSeed {
        reason: reason.into(),
    }
}

/// Load a parsed seed: fill the document store, register templates, and
/// reconcile every document into every index
///
/// Per-document root failures are collected in the summary, not fatal.
///
/// # Errors
/// * `ConcurrentModification` - writer lock budget exhausted
pub fn load_seed(
    registry: &IndexRegistry,
    store: &mut DocumentStore,
    seed: SeedFile,
) -> Result<SeedSummary> {
    let mut summary = SeedSummary {
        documents: seed.documents.len(),
        indexes: seed.indexes.len(),
        ..SeedSummary::default()
    };

    for doc in seed.documents {
        let mut record = DocumentRecord::new(doc.id, doc.document_type, doc.label);
        record.metadata = doc.metadata;
        store.insert(record);
    }

    let contexts = store.contexts();
    for index in seed.indexes {
        let template = TemplateTree::with_roots(
            index.templates.into_iter().map(to_template_node).collect(),
        );
        registry.set_template(&index.id, template);

        let mut aggregate = ReindexResult::default();
        for ctx in &contexts {
            match registry.reindex_one(ctx, &index.id) {
                Ok(result) => aggregate.absorb(result),
                Err(err @ IndexError::Reindex { .. }) => {
                    summary.failures.push((index.id.clone(), err));
                }
                Err(err) => return Err(err),
            }
        }
        summary.results.insert(index.id, aggregate);
    }

    Ok(summary)
}

fn to_template_node(seed: SeedTemplateNode) -> TemplateNode {
    let mut node = TemplateNode::new(seed.expression)
        .enabled(seed.enabled)
        .linking(seed.link_documents);
    node.children = seed.children.into_iter().map(to_template_node).collect();
    node
}
