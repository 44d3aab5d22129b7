//! docdex Engine - concurrency and orchestration layer
//!
//! The kernel in `docdex-core` is single-threaded; this crate makes it
//! safe under concurrent document events:
//!
//! - **Index Registry**: maps index IDs to (template tree, instance
//!   state) slots; entry point for `trigger_reindex` and
//!   `remove_document_everywhere`
//! - **Single writer per index**: each slot's state sits behind a mutex,
//!   so reconciliation of the same index is serialized while unrelated
//!   indexes proceed in parallel
//! - **Bounded retry**: writer-lock acquisition backs off and surfaces
//!   `ConcurrentModification` when the budget is exhausted
//! - **Audit emission**: kernel-produced events are forwarded to the
//!   configured `EventSink` after each pass commits
//! - **Rename counters**: per-document counters of indexing-driven moves
//!   with a loop guard
//! - **Seeding**: JSON fixtures describing documents and index templates

pub mod registry;
pub mod rename;
pub mod retry;
pub mod seed;

pub use registry::{IndexRegistry, IndexSlot};
pub use rename::RenameCounters;
pub use retry::{run_with_retry, RetryPolicy};
pub use seed::{load_seed, parse_seed, SeedFile, SeedSummary};
