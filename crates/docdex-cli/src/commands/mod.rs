pub mod render;
pub mod seed;
pub mod snapshot;

use std::path::Path;

use docdex_core::ops::DocumentStore;
use docdex_engine::{load_seed, parse_seed, IndexRegistry, SeedSummary};

/// Read a seed file and build its registry
///
/// There is no persistence layer (durable storage is an external
/// collaborator); every invocation rebuilds the indexes from the seed.
pub fn build_from_seed(
    path: &Path,
) -> Result<(IndexRegistry, DocumentStore, SeedSummary), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let seed = parse_seed(&json)?;

    let registry = IndexRegistry::new();
    let mut store = DocumentStore::new();
    let summary = load_seed(&registry, &mut store, seed)?;

    Ok((registry, store, summary))
}
