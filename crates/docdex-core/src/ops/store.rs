use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{IndexError, Result};
use crate::model::InstanceNode;

/// Arena store for one index's instance tree
///
/// Nodes are addressed by stable string identifiers; parent/child links are
/// IDs into the arena, never owning references, so the tree carries no
/// reference cycles. A reverse index from document ID to attachment nodes
/// drives the detach diff during reconciliation.
///
/// Not thread-safe by itself: the engine serializes writers per index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexState {
    nodes: HashMap<String, InstanceNode>,
    root_id: String,
    doc_index: HashMap<String, BTreeSet<String>>,
}

impl IndexState {
    /// Create a state holding only the synthetic root
    pub fn new() -> Self {
        let root = InstanceNode::root(Uuid::now_v7().to_string());
        let root_id = root.id.clone();
        let mut nodes = HashMap::new();
        nodes.insert(root_id.clone(), root);
        Self {
            nodes,
            root_id,
            doc_index: HashMap::new(),
        }
    }

    /// ID of the synthetic root (never pruned)
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Get a node by ID
    ///
    /// # Errors
    /// Returns `NodeNotFound` if the node doesn't exist.
    pub fn get_node(&self, id: &str) -> Result<&InstanceNode> {
        self.nodes.get(id).ok_or_else(|| IndexError::NodeNotFound {
            node_id: id.to_string(),
        })
    }

    fn get_node_mut(&mut self, id: &str) -> Result<&mut InstanceNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| IndexError::NodeNotFound {
                node_id: id.to_string(),
            })
    }

    /// Find the child of `parent_id` holding `value`, if any
    ///
    /// Values are the identity key within a sibling set: at most one match
    /// exists.
    pub fn find_child(&self, parent_id: &str, value: &str) -> Result<Option<String>> {
        let parent = self.get_node(parent_id)?;
        for child_id in &parent.child_ids {
            if let Some(child) = self.nodes.get(child_id) {
                if child.value == value {
                    return Ok(Some(child_id.clone()));
                }
            }
        }
        Ok(None)
    }

    /// Find the child holding `value` or create it
    ///
    /// Returns the child ID and whether it was newly created.
    pub fn find_or_create_child(
        &mut self,
        parent_id: &str,
        template_id: &str,
        value: &str,
    ) -> Result<(String, bool)> {
        if let Some(existing) = self.find_child(parent_id, value)? {
            return Ok((existing, false));
        }

        let node = InstanceNode::new(
            Uuid::now_v7().to_string(),
            value.to_string(),
            parent_id.to_string(),
            template_id.to_string(),
        );
        let node_id = node.id.clone();
        self.nodes.insert(node_id.clone(), node);
        self.get_node_mut(parent_id)?.child_ids.push(node_id.clone());
        Ok((node_id, true))
    }

    /// Attach a document at a node
    ///
    /// Returns true if the document was newly attached.
    pub fn attach_document(&mut self, node_id: &str, document_id: &str) -> Result<bool> {
        let inserted = self
            .get_node_mut(node_id)?
            .documents
            .insert(document_id.to_string());
        if inserted {
            self.doc_index
                .entry(document_id.to_string())
                .or_default()
                .insert(node_id.to_string());
        }
        Ok(inserted)
    }

    /// Detach a document from a node
    ///
    /// Returns true if the document was attached before the call.
    pub fn detach_document(&mut self, node_id: &str, document_id: &str) -> Result<bool> {
        let removed = self.get_node_mut(node_id)?.documents.remove(document_id);
        if removed {
            if let Some(nodes) = self.doc_index.get_mut(document_id) {
                nodes.remove(node_id);
                if nodes.is_empty() {
                    self.doc_index.remove(document_id);
                }
            }
        }
        Ok(removed)
    }

    /// IDs of the nodes a document is attached to
    pub fn nodes_for_document(&self, document_id: &str) -> BTreeSet<String> {
        self.doc_index
            .get(document_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove an empty non-root node from the arena
    ///
    /// # Errors
    /// * `NodeNotFound` - node doesn't exist
    /// * `NodeNotEmpty` - node still holds documents or children, or is
    ///   the synthetic root
    pub fn remove_empty_node(&mut self, node_id: &str) -> Result<()> {
        let node = self.get_node(node_id)?;
        if node.is_root() || !node.is_empty() {
            return Err(IndexError::NodeNotEmpty {
                node_id: node_id.to_string(),
            });
        }

        let parent_id = node.parent_id.clone();
        self.nodes.remove(node_id);
        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.child_ids.retain(|id| id.as_str() != node_id);
            }
        }
        Ok(())
    }

    /// Values along the path from the root to a node (root excluded)
    pub fn path_values(&self, node_id: &str) -> Result<Vec<String>> {
        let mut path = Vec::new();
        let mut current = Some(node_id.to_string());

        while let Some(id) = current {
            let node = self.get_node(&id)?;
            if node.is_root() {
                break;
            }
            path.push(node.value.clone());
            current = node.parent_id.clone();
        }

        path.reverse();
        Ok(path)
    }

    /// Number of nodes including the synthetic root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All document IDs attached anywhere in this index
    pub fn document_ids(&self) -> BTreeSet<String> {
        self.doc_index.keys().cloned().collect()
    }

    /// Iterate over all nodes in unspecified order
    pub fn iter_nodes(&self) -> impl Iterator<Item = &InstanceNode> {
        self.nodes.values()
    }
}

impl Default for IndexState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_only_root() {
        let state = IndexState::new();
        assert_eq!(state.node_count(), 1);
        assert!(state.get_node(state.root_id()).unwrap().is_root());
    }

    #[test]
    fn test_find_or_create_is_keyed_by_value() {
        let mut state = IndexState::new();
        let root = state.root_id().to_string();

        let (a, created_a) = state.find_or_create_child(&root, "t-1", "2020").unwrap();
        let (b, created_b) = state.find_or_create_child(&root, "t-1", "2020").unwrap();

        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a, b);
        assert_eq!(state.node_count(), 2);
    }

    #[test]
    fn test_attach_detach_maintains_reverse_index() {
        let mut state = IndexState::new();
        let root = state.root_id().to_string();
        let (node, _) = state.find_or_create_child(&root, "t-1", "2020").unwrap();

        assert!(state.attach_document(&node, "doc-1").unwrap());
        assert!(!state.attach_document(&node, "doc-1").unwrap());
        assert_eq!(
            state.nodes_for_document("doc-1"),
            BTreeSet::from([node.clone()])
        );

        assert!(state.detach_document(&node, "doc-1").unwrap());
        assert!(!state.detach_document(&node, "doc-1").unwrap());
        assert!(state.nodes_for_document("doc-1").is_empty());
    }

    #[test]
    fn test_remove_empty_node_refuses_root_and_nonempty() {
        let mut state = IndexState::new();
        let root = state.root_id().to_string();
        let (node, _) = state.find_or_create_child(&root, "t-1", "2020").unwrap();

        assert!(matches!(
            state.remove_empty_node(&root),
            Err(IndexError::NodeNotEmpty { .. })
        ));

        state.attach_document(&node, "doc-1").unwrap();
        assert!(matches!(
            state.remove_empty_node(&node),
            Err(IndexError::NodeNotEmpty { .. })
        ));

        state.detach_document(&node, "doc-1").unwrap();
        state.remove_empty_node(&node).unwrap();
        assert_eq!(state.node_count(), 1);
        assert!(state
            .get_node(&root)
            .unwrap()
            .child_ids
            .is_empty());
    }

    #[test]
    fn test_path_values() {
        let mut state = IndexState::new();
        let root = state.root_id().to_string();
        let (year, _) = state.find_or_create_child(&root, "t-1", "2020").unwrap();
        let (cat, _) = state.find_or_create_child(&year, "t-2", "invoice").unwrap();

        assert_eq!(state.path_values(&cat).unwrap(), vec!["2020", "invoice"]);
        assert!(state.path_values(&root).unwrap().is_empty());
    }
}
