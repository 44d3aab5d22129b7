use dashmap::DashMap;

/// Default number of indexing-driven moves tolerated per document before
/// the loop guard stops emitting rename events
pub const DEFAULT_RENAME_LIMIT: u64 = 16;

/// Per-document counters of indexing-driven rename/move operations
///
/// A reconciliation pass that relocates a document (detached from old
/// nodes and attached at new ones) counts as one move. The counter is
/// monotonically increasing and reset only by explicit administrative
/// action; once a document exceeds the limit the registry stops emitting
/// rename events for it, breaking feedback loops between indexing and
/// renaming collaborators.
#[derive(Debug)]
pub struct RenameCounters {
    counts: DashMap<String, u64>,
    limit: u64,
}

impl RenameCounters {
    /// Create counters with the default loop-guard limit
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_RENAME_LIMIT)
    }

    /// Create counters with an explicit loop-guard limit
    pub fn with_limit(limit: u64) -> Self {
        Self {
            counts: DashMap::new(),
            limit,
        }
    }

    /// Record one move for a document, returning the new count
    pub fn increment(&self, document_id: &str) -> u64 {
        let mut entry = self.counts.entry(document_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current count for a document
    pub fn count(&self, document_id: &str) -> u64 {
        self.counts.get(document_id).map(|c| *c).unwrap_or(0)
    }

    /// Whether the document is still under the loop-guard limit
    pub fn within_limit(&self, document_id: &str) -> bool {
        self.count(document_id) <= self.limit
    }

    /// Administrative reset of a document's counter
    pub fn reset(&self, document_id: &str) {
        self.counts.remove(document_id);
    }
}

impl Default for RenameCounters {
    fn default() -> Self {
        Self::new()
    }
}
