//! Reconciliation: align one index's instance tree with one document
//!
//! The pass is two-phase. Phase A walks the template tree with the
//! evaluator and computes the desired attachment paths without touching
//! the instance tree; a root-level evaluation failure therefore aborts the
//! pass before any mutation (all-or-nothing at the root). Phase B diffs
//! the desired attachment set against the document's current attachments,
//! creates missing nodes, attaches, detaches, and prunes empty branches
//! bottom-up.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::store::IndexState;
use crate::errors::{IndexError, Result};
use crate::eval::Evaluator;
use crate::events::AuditEvent;
use crate::model::{DocumentContext, TemplateNode, TemplateTree};

/// Cooperative cancellation handle for a reconciliation pass
///
/// Cancellation observed before phase B leaves the tree untouched;
/// cancellation observed during node creation re-enters the prune phase so
/// no empty nodes are left behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Outcome of one reconciliation pass
///
/// Empty on a no-op pass: re-running reconciliation for an unchanged
/// document against an unchanged template tree mutates nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReindexResult {
    /// IDs of instance nodes created by this pass
    pub nodes_added: Vec<String>,
    /// IDs of instance nodes pruned by this pass
    pub nodes_removed: Vec<String>,
    /// IDs of nodes the document was newly attached to
    pub attached: Vec<String>,
    /// IDs of nodes the document was detached from
    pub detached: Vec<String>,
    /// Audit events describing every mutation, in order
    pub events: Vec<AuditEvent>,
}

impl ReindexResult {
    /// True when the pass performed no tree mutation
    pub fn is_noop(&self) -> bool {
        self.nodes_added.is_empty()
            && self.nodes_removed.is_empty()
            && self.attached.is_empty()
            && self.detached.is_empty()
    }

    /// Merge another result into this one, preserving event order
    pub fn absorb(&mut self, other: ReindexResult) {
        self.nodes_added.extend(other.nodes_added);
        self.nodes_removed.extend(other.nodes_removed);
        self.attached.extend(other.attached);
        self.detached.extend(other.detached);
        self.events.extend(other.events);
    }
}

/// One desired attachment: the value path from the root and the template
/// node generating each segment
#[derive(Debug, Clone, PartialEq)]
struct AttachPath {
    segments: Vec<(String, String)>, // (template_id, value)
}

/// Reconcile one document against one index
///
/// # Errors
/// * `Reindex` - a root-level expression failed; no mutation was applied
pub fn reindex(
    state: &mut IndexState,
    template: &TemplateTree,
    ctx: &DocumentContext,
    index_id: &str,
) -> Result<ReindexResult> {
    reindex_with_cancel(state, template, ctx, index_id, &CancelToken::new())
}

/// Reconcile with a cancellation token
///
/// # Errors
/// * `Reindex` - root-level expression failure, no mutation applied
/// * `Cancelled` - the token was triggered; any nodes created before the
///   cancellation was observed have been pruned again
pub fn reindex_with_cancel(
    state: &mut IndexState,
    template: &TemplateTree,
    ctx: &DocumentContext,
    index_id: &str,
    cancel: &CancelToken,
) -> Result<ReindexResult> {
    // Phase A: pure computation, no tree access
    let desired = compute_desired_paths(template, ctx).map_err(|cause| IndexError::Reindex {
        document_id: ctx.document_id.clone(),
        index_id: index_id.to_string(),
        cause: Box::new(cause),
    })?;

    if cancel.is_cancelled() {
        return Err(cancelled(ctx, index_id));
    }

    let mut result = ReindexResult::default();

    // Phase B step 1: materialize desired paths (no attachments yet, so a
    // cancellation here can undo cleanly)
    let mut target_nodes = BTreeSet::new();
    let mut interrupted = false;
    for path in &desired {
        if cancel.is_cancelled() {
            interrupted = true;
            break;
        }
        let node_id = ensure_path(state, path, index_id, &mut result)?;
        target_nodes.insert(node_id);
    }

    if interrupted {
        // Creation-order reverse guarantees children go before parents
        for node_id in result.nodes_added.iter().rev() {
            if state.get_node(node_id).map(|n| n.is_empty()).unwrap_or(false) {
                state.remove_empty_node(node_id)?;
            }
        }
        return Err(cancelled(ctx, index_id));
    }

    // Phase B step 2: attach at every target node
    for node_id in &target_nodes {
        if state.attach_document(node_id, &ctx.document_id)? {
            result.attached.push(node_id.clone());
            result.events.push(AuditEvent::DocumentAttached {
                index_id: index_id.to_string(),
                node_id: node_id.clone(),
                document_id: ctx.document_id.clone(),
            });
        }
    }

    // Phase B step 3: detach from stale nodes and prune
    let previous = state.nodes_for_document(&ctx.document_id);
    let stale: Vec<String> = previous.difference(&target_nodes).cloned().collect();
    for node_id in &stale {
        state.detach_document(node_id, &ctx.document_id)?;
        result.detached.push(node_id.clone());
        result.events.push(AuditEvent::DocumentDetached {
            index_id: index_id.to_string(),
            node_id: node_id.clone(),
            document_id: ctx.document_id.clone(),
        });
    }
    prune_upward(state, stale, index_id, &mut result)?;

    Ok(result)
}

/// Remove a document from an index entirely, pruning emptied branches
pub fn remove_document(
    state: &mut IndexState,
    document_id: &str,
    index_id: &str,
) -> Result<ReindexResult> {
    let mut result = ReindexResult::default();
    let attached: Vec<String> = state.nodes_for_document(document_id).into_iter().collect();

    for node_id in &attached {
        state.detach_document(node_id, document_id)?;
        result.detached.push(node_id.clone());
        result.events.push(AuditEvent::DocumentDetached {
            index_id: index_id.to_string(),
            node_id: node_id.clone(),
            document_id: document_id.to_string(),
        });
    }
    prune_upward(state, attached, index_id, &mut result)?;

    Ok(result)
}

fn cancelled(ctx: &DocumentContext, index_id: &str) -> IndexError {
    IndexError::Cancelled {
        document_id: ctx.document_id.clone(),
        index_id: index_id.to_string(),
    }
}

/// Phase A: compute every path the document should be attached at
///
/// A level-one evaluation failure propagates; deeper failures skip the
/// affected sub-path only (siblings are unaffected).
fn compute_desired_paths(
    template: &TemplateTree,
    ctx: &DocumentContext,
) -> Result<Vec<AttachPath>> {
    let mut evaluator = Evaluator::new();
    let mut paths = Vec::new();
    for node in &template.roots {
        walk_template(node, &[], 0, ctx, &mut evaluator, &mut paths)?;
    }
    Ok(paths)
}

fn walk_template(
    node: &TemplateNode,
    prefix: &[(String, String)],
    depth: usize,
    ctx: &DocumentContext,
    evaluator: &mut Evaluator,
    out: &mut Vec<AttachPath>,
) -> Result<()> {
    if !node.enabled {
        return Ok(());
    }

    let values = match evaluator.evaluate(&node.expression, ctx) {
        Ok(values) => values,
        Err(err) if depth == 0 => return Err(err),
        Err(err) => {
            tracing::debug!(
                component = module_path!(),
                document_id = %ctx.document_id,
                template_id = %node.id,
                error = %err,
                "expression does not apply to document, skipping branch"
            );
            return Ok(());
        }
    };

    for value in values {
        let mut path = prefix.to_vec();
        path.push((node.id.clone(), value));

        if node.is_leaf() {
            out.push(AttachPath {
                segments: path,
            });
        } else {
            if node.link_documents {
                out.push(AttachPath {
                    segments: path.clone(),
                });
            }
            for child in node.active_children() {
                walk_template(child, &path, depth + 1, ctx, evaluator, out)?;
            }
        }
    }

    Ok(())
}

/// Find-or-create every node along a path, returning the terminal node ID
fn ensure_path(
    state: &mut IndexState,
    path: &AttachPath,
    index_id: &str,
    result: &mut ReindexResult,
) -> Result<String> {
    let mut parent_id = state.root_id().to_string();
    for (template_id, value) in &path.segments {
        let (node_id, created) = state.find_or_create_child(&parent_id, template_id, value)?;
        if created {
            result.nodes_added.push(node_id.clone());
            result.events.push(AuditEvent::NodeCreated {
                index_id: index_id.to_string(),
                node_id: node_id.clone(),
                template_id: template_id.clone(),
                value: value.clone(),
            });
        }
        parent_id = node_id;
    }
    Ok(parent_id)
}

/// Prune phase: from every seed, climb while nodes are empty
///
/// Deletion stops at the first non-empty ancestor or at the synthetic
/// root, which is never removed.
fn prune_upward(
    state: &mut IndexState,
    seeds: impl IntoIterator<Item = String>,
    index_id: &str,
    result: &mut ReindexResult,
) -> Result<()> {
    for seed in seeds {
        let mut current = Some(seed);
        while let Some(node_id) = current {
            let node = match state.get_node(&node_id) {
                Ok(node) => node,
                // Already pruned via an earlier seed sharing this ancestor chain
                Err(IndexError::NodeNotFound { .. }) => break,
                Err(err) => return Err(err),
            };
            if node.is_root() || !node.is_empty() {
                break;
            }
            let parent_id = node.parent_id.clone();
            let value = node.value.clone();
            state.remove_empty_node(&node_id)?;
            result.nodes_removed.push(node_id.clone());
            result.events.push(AuditEvent::NodeRemoved {
                index_id: index_id.to_string(),
                node_id,
                value,
            });
            current = parent_id;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn year_category_template() -> TemplateTree {
        TemplateTree::with_roots(vec![
            TemplateNode::new("metadata.year").child(TemplateNode::new("metadata.category")),
        ])
    }

    fn doc(id: &str, year: &str, category: &str) -> DocumentContext {
        DocumentContext::new(id)
            .with_metadata("year", year)
            .with_metadata("category", category)
    }

    #[test]
    fn test_reindex_builds_shared_path() {
        let mut state = IndexState::new();
        let template = year_category_template();

        let r1 = reindex(&mut state, &template, &doc("d1", "2020", "invoice"), "idx").unwrap();
        let r2 = reindex(&mut state, &template, &doc("d2", "2020", "receipt"), "idx").unwrap();

        // d1 created "2020" and "invoice"; d2 reused "2020", created "receipt"
        assert_eq!(r1.nodes_added.len(), 2);
        assert_eq!(r2.nodes_added.len(), 1);
        assert_eq!(state.node_count(), 4); // root + 2020 + invoice + receipt

        let d1_nodes = state.nodes_for_document("d1");
        assert_eq!(d1_nodes.len(), 1);
        let leaf = d1_nodes.iter().next().unwrap();
        assert_eq!(state.path_values(leaf).unwrap(), vec!["2020", "invoice"]);
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let mut state = IndexState::new();
        let template = year_category_template();
        let ctx = doc("d1", "2020", "invoice");

        let first = reindex(&mut state, &template, &ctx, "idx").unwrap();
        let second = reindex(&mut state, &template, &ctx, "idx").unwrap();

        assert!(!first.is_noop());
        assert!(second.is_noop());
        assert!(second.events.is_empty());
    }

    #[test]
    fn test_metadata_change_moves_document_and_prunes() {
        let mut state = IndexState::new();
        let template = year_category_template();

        reindex(&mut state, &template, &doc("d1", "2020", "invoice"), "idx").unwrap();
        let moved = reindex(&mut state, &template, &doc("d1", "2021", "invoice"), "idx").unwrap();

        assert_eq!(moved.attached.len(), 1);
        assert_eq!(moved.detached.len(), 1);
        // Old "invoice" leaf and its "2020" parent are both gone
        assert_eq!(moved.nodes_removed.len(), 2);
        assert_eq!(state.node_count(), 3); // root + 2021 + invoice
    }

    #[test]
    fn test_remove_document_prunes_empty_ancestors_only() {
        let mut state = IndexState::new();
        let template = year_category_template();

        reindex(&mut state, &template, &doc("d1", "2020", "invoice"), "idx").unwrap();
        reindex(&mut state, &template, &doc("d2", "2020", "receipt"), "idx").unwrap();

        let removed = remove_document(&mut state, "d1", "idx").unwrap();

        // "invoice" pruned; "2020" kept (still holds "receipt")
        assert_eq!(removed.nodes_removed.len(), 1);
        assert_eq!(state.node_count(), 3); // root + 2020 + receipt
        assert!(state.nodes_for_document("d1").is_empty());
        assert_eq!(state.nodes_for_document("d2").len(), 1);
    }

    #[test]
    fn test_fan_out_attaches_at_every_value() {
        let mut state = IndexState::new();
        let template = TemplateTree::with_roots(vec![TemplateNode::new("metadata.tags")]);
        let ctx = DocumentContext::new("d1").with_metadata("tags", json!(["A", "B"]));

        let result = reindex(&mut state, &template, &ctx, "idx").unwrap();

        assert_eq!(result.nodes_added.len(), 2);
        assert_eq!(result.attached.len(), 2);
        assert_eq!(state.nodes_for_document("d1").len(), 2);
    }

    #[test]
    fn test_root_failure_is_atomic() {
        let mut state = IndexState::new();
        let template = year_category_template();
        // No metadata at all: the root expression fails
        let ctx = DocumentContext::new("d1");

        let err = reindex(&mut state, &template, &ctx, "idx").unwrap_err();

        assert_eq!(err.code(), "ERR_REINDEX");
        assert_eq!(state.node_count(), 1);
        assert!(state.nodes_for_document("d1").is_empty());
    }

    #[test]
    fn test_below_root_failure_skips_subpath_only() {
        let mut state = IndexState::new();
        let template = year_category_template();
        // Year present, category missing: the level-2 expression fails
        let ctx = DocumentContext::new("d1").with_metadata("year", "2020");

        let result = reindex(&mut state, &template, &ctx, "idx").unwrap();

        // Nothing attaches: the only leaf level failed, and the bare
        // "2020" node would be empty, so it is never materialized
        assert!(result.is_noop());
        assert_eq!(state.node_count(), 1);
    }

    #[test]
    fn test_link_documents_attaches_at_intermediate_level() {
        let mut state = IndexState::new();
        let template = TemplateTree::with_roots(vec![TemplateNode::new("metadata.year")
            .linking(true)
            .child(TemplateNode::new("metadata.category"))]);

        reindex(&mut state, &template, &doc("d1", "2020", "invoice"), "idx").unwrap();

        // Attached at both the "2020" level and the "invoice" leaf
        assert_eq!(state.nodes_for_document("d1").len(), 2);
    }

    #[test]
    fn test_disabled_template_subtree_is_skipped() {
        let mut state = IndexState::new();
        let template = TemplateTree::with_roots(vec![
            TemplateNode::new("metadata.year"),
            TemplateNode::new("metadata.category").enabled(false),
        ]);

        reindex(&mut state, &template, &doc("d1", "2020", "invoice"), "idx").unwrap();

        assert_eq!(state.node_count(), 2); // root + 2020
    }

    #[test]
    fn test_cancellation_before_mutation_leaves_tree_untouched() {
        let mut state = IndexState::new();
        let template = year_category_template();
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = reindex_with_cancel(
            &mut state,
            &template,
            &doc("d1", "2020", "invoice"),
            "idx",
            &cancel,
        )
        .unwrap_err();

        assert_eq!(err.code(), "ERR_CANCELLED");
        assert_eq!(state.node_count(), 1);
    }
}
