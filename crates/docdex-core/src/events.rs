//! Audit event surface
//!
//! Every instance-tree mutation produces one audit event. The kernel
//! collects events into the `ReindexResult`; the engine forwards them to
//! the configured [`EventSink`] after the pass commits. Consumers are
//! external observability/audit collaborators.

use std::sync::Mutex;

use docdex_core_types::schema;
use serde::{Deserialize, Serialize};

/// One per-mutation audit event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    NodeCreated {
        index_id: String,
        node_id: String,
        template_id: String,
        value: String,
    },
    NodeRemoved {
        index_id: String,
        node_id: String,
        value: String,
    },
    DocumentAttached {
        index_id: String,
        node_id: String,
        document_id: String,
    },
    DocumentDetached {
        index_id: String,
        node_id: String,
        document_id: String,
    },
    DocumentRenamed {
        index_id: String,
        document_id: String,
        rename_count: u64,
    },
}

impl AuditEvent {
    /// Canonical event name as published to consumers
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::NodeCreated { .. } => schema::AUDIT_NODE_CREATED,
            AuditEvent::NodeRemoved { .. } => schema::AUDIT_NODE_REMOVED,
            AuditEvent::DocumentAttached { .. } => schema::AUDIT_DOCUMENT_ATTACHED,
            AuditEvent::DocumentDetached { .. } => schema::AUDIT_DOCUMENT_DETACHED,
            AuditEvent::DocumentRenamed { .. } => schema::AUDIT_DOCUMENT_RENAMED,
        }
    }
}

/// Collaborator trait consuming audit events
///
/// Implementations must tolerate being called from multiple reconciliation
/// tasks concurrently.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &AuditEvent);
}

/// Sink that discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &AuditEvent) {}
}

/// Sink that records events in memory, for tests and diagnostics
#[derive(Debug, Default)]
pub struct VecEventSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all recorded events
    pub fn take(&self) -> Vec<AuditEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for VecEventSink {
    fn emit(&self, event: &AuditEvent) {
        self.lock().push(event.clone());
    }
}
