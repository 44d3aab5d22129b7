use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use std::time::Instant;

use dashmap::DashMap;

use docdex_core::errors::{IndexError, Result};
use docdex_core::events::{AuditEvent, EventSink, NoopEventSink};
use docdex_core::model::{DocumentContext, TemplateTree};
use docdex_core::ops::{self, IndexState, ReindexResult};

use crate::rename::RenameCounters;
use crate::retry::RetryPolicy;

/// One registered index: template tree plus instance state
///
/// The state mutex enforces the single-writer-per-index rule; the
/// template sits behind a read lock because it is only replaced
/// out-of-band by administrative edits.
#[derive(Debug)]
pub struct IndexSlot {
    template: RwLock<TemplateTree>,
    state: Mutex<IndexState>,
}

impl IndexSlot {
    fn new() -> Self {
        Self {
            template: RwLock::new(TemplateTree::new()),
            state: Mutex::new(IndexState::new()),
        }
    }
}

/// Maps index identifiers to slots; entry point for document events
///
/// Reconciliation tasks for different indexes run in parallel; tasks for
/// the same index serialize on the slot's writer lock. Lock acquisition
/// is bounded: when the retry budget is exhausted the call surfaces
/// `ConcurrentModification`, which callers may retry with
/// [`crate::retry::run_with_retry`].
pub struct IndexRegistry {
    slots: DashMap<String, Arc<IndexSlot>>,
    sink: Arc<dyn EventSink>,
    renames: RenameCounters,
    retry: RetryPolicy,
}

impl IndexRegistry {
    /// Create a registry that discards audit events
    pub fn new() -> Self {
        Self::with_sink(Arc::new(NoopEventSink))
    }

    /// Create a registry emitting audit events to the given sink
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            slots: DashMap::new(),
            sink,
            renames: RenameCounters::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the lock-acquisition retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get an index slot, creating an empty one if absent
    pub fn get_or_create_index(&self, index_id: &str) -> Arc<IndexSlot> {
        self.slots
            .entry(index_id.to_string())
            .or_insert_with(|| Arc::new(IndexSlot::new()))
            .clone()
    }

    /// Registered index IDs, sorted
    pub fn index_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.slots.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Replace an index's template tree
    ///
    /// Existing instance nodes are not touched: a template edit is
    /// followed by re-reindexing the affected documents (see
    /// [`IndexRegistry::rebuild_index`]).
    pub fn set_template(&self, index_id: &str, template: TemplateTree) {
        let slot = self.get_or_create_index(index_id);
        *write_lock(&slot.template) = template;
    }

    /// Reconcile one document against one index
    ///
    /// # Errors
    /// * `Reindex` - root-level expression failure, no mutation applied
    /// * `ConcurrentModification` - writer lock budget exhausted
    pub fn reindex_one(&self, ctx: &DocumentContext, index_id: &str) -> Result<ReindexResult> {
        docdex_core::log_op_start!(
            "reindex",
            document_id = %ctx.document_id,
            index_id = %index_id
        );
        let started = Instant::now();

        let slot = self.get_or_create_index(index_id);
        let template = read_lock(&slot.template).clone();

        let result = {
            let mut state = self.lock_state(&slot, index_id)?;
            ops::reindex(&mut state, &template, ctx, index_id).map_err(|err| {
                docdex_core::log_op_error!("reindex", err.code(), err.to_string());
                err
            })?
        };

        self.account_rename(ctx, index_id, &result);
        self.emit_all(&result);

        docdex_core::log_op_end!(
            "reindex",
            duration_ms = started.elapsed().as_millis() as u64,
            nodes_added = result.nodes_added.len(),
            nodes_removed = result.nodes_removed.len()
        );
        Ok(result)
    }

    /// Reconcile one document against a set of indexes
    ///
    /// Failures are per-index: one index failing does not stop the
    /// others. The caller inspects the per-index results.
    pub fn trigger_reindex(
        &self,
        ctx: &DocumentContext,
        index_ids: &BTreeSet<String>,
    ) -> BTreeMap<String, Result<ReindexResult>> {
        index_ids
            .iter()
            .map(|index_id| (index_id.clone(), self.reindex_one(ctx, index_id)))
            .collect()
    }

    /// Remove a document from every registered index
    pub fn remove_document_everywhere(
        &self,
        document_id: &str,
    ) -> BTreeMap<String, Result<ReindexResult>> {
        let mut results = BTreeMap::new();
        for index_id in self.index_ids() {
            let outcome = self.remove_document(document_id, &index_id);
            results.insert(index_id, outcome);
        }
        results
    }

    /// Remove a document from one index
    ///
    /// # Errors
    /// * `ConcurrentModification` - writer lock budget exhausted
    pub fn remove_document(&self, document_id: &str, index_id: &str) -> Result<ReindexResult> {
        let slot = self.get_or_create_index(index_id);
        let result = {
            let mut state = self.lock_state(&slot, index_id)?;
            ops::remove_document(&mut state, document_id, index_id)?
        };
        self.emit_all(&result);
        Ok(result)
    }

    /// Rebuild an index from scratch for a document population
    ///
    /// Used after template edits: the instance state is reset and every
    /// document reconciled against the new template. Per-document root
    /// failures are collected, not fatal.
    ///
    /// # Errors
    /// * `ConcurrentModification` - writer lock budget exhausted
    pub fn rebuild_index(
        &self,
        index_id: &str,
        docs: &[DocumentContext],
    ) -> Result<(ReindexResult, Vec<IndexError>)> {
        let slot = self.get_or_create_index(index_id);
        let template = read_lock(&slot.template).clone();

        let mut aggregate = ReindexResult::default();
        let mut failures = Vec::new();
        {
            let mut state = self.lock_state(&slot, index_id)?;
            *state = IndexState::new();
            for ctx in docs {
                match ops::reindex(&mut state, &template, ctx, index_id) {
                    Ok(result) => aggregate.absorb(result),
                    Err(err) => failures.push(err),
                }
            }
        }

        self.emit_all(&aggregate);
        Ok((aggregate, failures))
    }

    /// Read access to an index's instance state (render, snapshot)
    ///
    /// # Errors
    /// * `IndexNotFound` - index was never registered
    /// * `ConcurrentModification` - writer lock budget exhausted
    pub fn with_state<T>(
        &self,
        index_id: &str,
        f: impl FnOnce(&IndexState) -> Result<T>,
    ) -> Result<T> {
        let slot = self
            .slots
            .get(index_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| IndexError::IndexNotFound {
                index_id: index_id.to_string(),
            })?;
        let state = self.lock_state(&slot, index_id)?;
        f(&state)
    }

    /// Per-document rename counters (loop guard)
    pub fn rename_counters(&self) -> &RenameCounters {
        &self.renames
    }

    fn lock_state<'a>(
        &self,
        slot: &'a IndexSlot,
        index_id: &str,
    ) -> Result<MutexGuard<'a, IndexState>> {
        let mut attempt = 0;
        loop {
            match slot.state.try_lock() {
                Ok(guard) => return Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(IndexError::ConcurrentModification {
                            index_id: index_id.to_string(),
                        });
                    }
                    std::thread::sleep(self.retry.delay_for(attempt - 1));
                }
            }
        }
    }

    /// A pass that both detached and attached moved the document; count it
    /// and emit a rename event unless the loop guard has tripped
    fn account_rename(&self, ctx: &DocumentContext, index_id: &str, result: &ReindexResult) {
        if result.detached.is_empty() || result.attached.is_empty() {
            return;
        }
        let rename_count = self.renames.increment(&ctx.document_id);
        if self.renames.within_limit(&ctx.document_id) {
            self.sink.emit(&AuditEvent::DocumentRenamed {
                index_id: index_id.to_string(),
                document_id: ctx.document_id.clone(),
                rename_count,
            });
        } else {
            tracing::warn!(
                component = module_path!(),
                document_id = %ctx.document_id,
                index_id = %index_id,
                rename_count,
                "rename loop guard tripped, suppressing rename event"
            );
        }
    }

    fn emit_all(&self, result: &ReindexResult) {
        for event in &result.events {
            self.sink.emit(event);
        }
    }
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
