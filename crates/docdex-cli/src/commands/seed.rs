//! Seed load command
//!
//! Usage: docdex seed <PATH>

use clap::Args;
use std::path::PathBuf;

use super::build_from_seed;

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Path to a JSON seed file
    pub path: PathBuf,
}

/// Execute seed load
pub fn execute(args: SeedArgs) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading {}...", args.path.display());
    let (registry, store, summary) = build_from_seed(&args.path)?;

    println!(
        "Loaded {} document(s) into {} index(es)",
        store.len(),
        summary.indexes
    );

    for (index_id, result) in &summary.results {
        let node_count = registry.with_state(index_id, |state| Ok(state.node_count()))?;
        println!(
            "  {}: {} node(s), {} created, {} attachment(s)",
            index_id,
            node_count,
            result.nodes_added.len(),
            result.attached.len()
        );
    }

    for (index_id, error) in &summary.failures {
        eprintln!("  warning: {}: {}", index_id, error);
    }

    Ok(())
}
