//! Snapshot command: manifest and digests
//!
//! Usage: docdex snapshot <PATH> --index <ID>

use clap::Args;
use std::path::PathBuf;

use docdex_core::snapshot::{compute_manifest_digest, compute_tree_digest, generate_manifest};

use super::build_from_seed;

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Path to a JSON seed file
    pub path: PathBuf,

    /// Index to snapshot
    #[arg(long)]
    pub index: String,

    /// Print the full manifest JSON instead of digests only
    #[arg(long)]
    pub manifest: bool,
}

/// Execute snapshot
pub fn execute(args: SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, _store, _summary) = build_from_seed(&args.path)?;

    let manifest = registry.with_state(&args.index, |state| generate_manifest(state, &args.index))?;
    let tree_digest = compute_tree_digest(&manifest.root)?;
    let manifest_digest = compute_manifest_digest(&manifest)?;

    println!("index: {}", manifest.index_id);
    println!("nodes: {}", manifest.node_count);
    println!("tree_digest: {}", tree_digest);
    println!("manifest_digest: {}", manifest_digest);

    if args.manifest {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    }

    Ok(())
}
