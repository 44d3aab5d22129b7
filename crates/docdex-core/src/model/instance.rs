use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// InstanceNode - one materialized value in an index's instance tree
///
/// Instance nodes are arena-stored in [`crate::ops::IndexState`] and linked
/// by identifier: `parent_id` is a pointer-by-ID, never an owning
/// back-reference. Within one parent's children, `value` is the identity
/// key: at most one child exists per distinct value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceNode {
    /// Unique identifier for this node (UUID v7)
    pub id: String,

    /// The literal computed by evaluating the generating template node's
    /// expression against one document. Empty only for the synthetic root.
    pub value: String,

    /// Parent node ID; None only for the synthetic root
    pub parent_id: Option<String>,

    /// ID of the template node whose evaluation produced this node;
    /// None only for the synthetic root
    pub template_id: Option<String>,

    /// Child node IDs in creation order
    pub child_ids: Vec<String>,

    /// Documents attached directly at this node
    pub documents: BTreeSet<String>,

    /// Timestamp when this node was materialized
    pub created_at: DateTime<Utc>,
}

impl InstanceNode {
    /// Create a new instance node under the given parent
    pub fn new(
        id: String,
        value: String,
        parent_id: String,
        template_id: String,
    ) -> Self {
        Self {
            id,
            value,
            parent_id: Some(parent_id),
            template_id: Some(template_id),
            child_ids: Vec::new(),
            documents: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Create the synthetic root of an instance tree
    pub fn root(id: String) -> Self {
        Self {
            id,
            value: String::new(),
            parent_id: None,
            template_id: None,
            child_ids: Vec::new(),
            documents: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether this is the synthetic root
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// A node with no documents and no children must be pruned
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.child_ids.is_empty()
    }
}
