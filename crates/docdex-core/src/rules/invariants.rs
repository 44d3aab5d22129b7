//! Structural invariant checks for instance trees
//!
//! Used by tests and diagnostics after mutating passes. A healthy tree
//! satisfies:
//!
//! - sibling uniqueness: under one parent, at most one child per value
//! - arena coherence: every child link resolves and points back to its
//!   parent
//! - no empty leaves: every non-root node holds documents or children
//! - reverse-index coherence: the document index lists exactly the nodes
//!   whose document sets contain the document

use std::collections::HashSet;

use crate::errors::{IndexError, Result};
use crate::ops::IndexState;

/// Verify all structural invariants of an instance tree
///
/// # Errors
/// Returns `InvariantViolation` naming the first violated rule.
pub fn check_invariants(state: &IndexState, index_id: &str) -> Result<()> {
    for node in state.iter_nodes() {
        // Sibling uniqueness (I1)
        let mut seen = HashSet::new();
        for child_id in &node.child_ids {
            let child = state.get_node(child_id).map_err(|_| violation(
                index_id,
                format!("node {} lists missing child {}", node.id, child_id),
            ))?;
            if child.parent_id.as_deref() != Some(node.id.as_str()) {
                return Err(violation(
                    index_id,
                    format!("child {} does not point back to parent {}", child_id, node.id),
                ));
            }
            if !seen.insert(child.value.clone()) {
                return Err(violation(
                    index_id,
                    format!(
                        "duplicate sibling value `{}` under node {}",
                        child.value, node.id
                    ),
                ));
            }
        }

        // No empty leaves (I2)
        if !node.is_root() && node.is_empty() {
            return Err(violation(
                index_id,
                format!("empty non-root node {} (value `{}`)", node.id, node.value),
            ));
        }

        // Reverse-index coherence: forward direction
        for document_id in &node.documents {
            if !state.nodes_for_document(document_id).contains(&node.id) {
                return Err(violation(
                    index_id,
                    format!(
                        "document {} attached at {} but absent from reverse index",
                        document_id, node.id
                    ),
                ));
            }
        }
    }

    // Reverse-index coherence: backward direction
    for document_id in state.document_ids() {
        for node_id in state.nodes_for_document(&document_id) {
            let node = state.get_node(&node_id).map_err(|_| violation(
                index_id,
                format!("reverse index lists missing node {}", node_id),
            ))?;
            if !node.documents.contains(&document_id) {
                return Err(violation(
                    index_id,
                    format!(
                        "reverse index lists {} at {} but the node disagrees",
                        document_id, node_id
                    ),
                ));
            }
        }
    }

    Ok(())
}

fn violation(index_id: &str, reason: String) -> IndexError {
    IndexError::InvariantViolation {
        index_id: index_id.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentContext, TemplateNode, TemplateTree};
    use crate::ops::reindex;

    #[test]
    fn test_healthy_tree_passes() {
        let mut state = IndexState::new();
        let template = TemplateTree::with_roots(vec![
            TemplateNode::new("metadata.year").child(TemplateNode::new("metadata.category")),
        ]);
        let ctx = DocumentContext::new("d1")
            .with_metadata("year", "2020")
            .with_metadata("category", "invoice");

        reindex(&mut state, &template, &ctx, "idx").unwrap();

        check_invariants(&state, "idx").unwrap();
    }

    #[test]
    fn test_empty_tree_passes() {
        check_invariants(&IndexState::new(), "idx").unwrap();
    }
}
