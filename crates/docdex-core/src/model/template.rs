use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// TemplateNode - one administrator-authored level of an index definition
///
/// Each node carries an expression that is evaluated against a document's
/// context to produce the values of the instance nodes at this level.
/// Template nodes form an ordered tree; the tree is immutable during a
/// reconciliation pass (edits happen out-of-band and trigger a full
/// re-evaluation of the index).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateNode {
    /// Unique identifier for this template node (UUID v7)
    pub id: String,

    /// Expression evaluated against the document context at this level
    pub expression: String,

    /// Disabled nodes are skipped together with their whole subtree
    pub enabled: bool,

    /// If true, documents are also attached at this level even when the
    /// tree descends further
    pub link_documents: bool,

    /// Ordered child levels
    pub children: Vec<TemplateNode>,
}

impl TemplateNode {
    /// Create an enabled template node with the given expression
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            expression: expression.into(),
            enabled: true,
            link_documents: false,
            children: Vec::new(),
        }
    }

    /// Append a child level, returning self for chained construction
    pub fn child(mut self, node: TemplateNode) -> Self {
        self.children.push(node);
        self
    }

    /// Set the link_documents flag
    pub fn linking(mut self, link_documents: bool) -> Self {
        self.link_documents = link_documents;
        self
    }

    /// Set the enabled flag
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enabled children, in declaration order
    pub fn active_children(&self) -> impl Iterator<Item = &TemplateNode> {
        self.children.iter().filter(|c| c.enabled)
    }

    /// A node with no enabled children is a leaf: documents attach here
    pub fn is_leaf(&self) -> bool {
        self.active_children().next().is_none()
    }
}

/// TemplateTree - the ordered hierarchy of template nodes for one index
///
/// The conceptual root carries no expression; `roots` holds the first
/// expression level. Read-only to the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateTree {
    pub roots: Vec<TemplateNode>,
}

impl TemplateTree {
    /// Create an empty template tree
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    /// Create a tree from root-level nodes
    pub fn with_roots(roots: Vec<TemplateNode>) -> Self {
        Self { roots }
    }

    /// Find a template node anywhere in the tree by ID
    pub fn find(&self, template_id: &str) -> Option<&TemplateNode> {
        fn walk<'a>(nodes: &'a [TemplateNode], id: &str) -> Option<&'a TemplateNode> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = walk(&node.children, id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.roots, template_id)
    }

    /// Total number of template nodes, enabled or not
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[TemplateNode]) -> usize {
            nodes.len() + nodes.iter().map(|n| count(&n.children)).sum::<usize>()
        }
        count(&self.roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_template_node() {
        let node = TemplateNode::new("metadata.year");

        assert_eq!(node.expression, "metadata.year");
        assert!(node.enabled);
        assert!(!node.link_documents);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_chained_construction() {
        let tree = TemplateTree::with_roots(vec![TemplateNode::new("metadata.year")
            .linking(true)
            .child(TemplateNode::new("metadata.category"))]);

        assert_eq!(tree.node_count(), 2);
        assert!(tree.roots[0].link_documents);
        assert!(!tree.roots[0].is_leaf());
        assert!(tree.roots[0].children[0].is_leaf());
    }

    #[test]
    fn test_disabled_children_are_not_active() {
        let node = TemplateNode::new("metadata.year")
            .child(TemplateNode::new("metadata.category").enabled(false));

        assert_eq!(node.children.len(), 1);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_find_by_id() {
        let child = TemplateNode::new("metadata.category");
        let child_id = child.id.clone();
        let tree = TemplateTree::with_roots(vec![TemplateNode::new("metadata.year").child(child)]);

        assert_eq!(tree.find(&child_id).unwrap().expression, "metadata.category");
        assert!(tree.find("missing").is_none());
    }
}
