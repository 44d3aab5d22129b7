use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::ops::IndexState;

/// Canonical representation of one instance node
///
/// Children appear in creation order, documents sorted lexicographically.
/// Node IDs are deliberately absent: two trees with the same values,
/// structure, and attachments are the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestNode {
    pub value: String,
    pub documents: Vec<String>,
    pub children: Vec<ManifestNode>,
}

/// Snapshot manifest for one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub index_id: String,
    pub generated_at: DateTime<Utc>,
    pub node_count: usize,
    pub root: ManifestNode,
}

/// Generate the canonical manifest of an instance tree
///
/// # Errors
/// Propagates `NodeNotFound` if the arena is inconsistent.
pub fn generate_manifest(state: &IndexState, index_id: &str) -> Result<IndexManifest> {
    let root = build_node(state, state.root_id())?;
    Ok(IndexManifest {
        index_id: index_id.to_string(),
        generated_at: Utc::now(),
        node_count: state.node_count(),
        root,
    })
}

fn build_node(state: &IndexState, node_id: &str) -> Result<ManifestNode> {
    let node = state.get_node(node_id)?;

    let mut children = Vec::with_capacity(node.child_ids.len());
    for child_id in &node.child_ids {
        children.push(build_node(state, child_id)?);
    }

    Ok(ManifestNode {
        value: node.value.clone(),
        documents: node.documents.iter().cloned().collect(),
        children,
    })
}
