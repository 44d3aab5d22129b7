//! Render command: instance tree to Markdown
//!
//! Usage: docdex render <PATH> --index <ID>

use clap::Args;
use std::path::PathBuf;

use docdex_core::render::render_index;

use super::build_from_seed;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Path to a JSON seed file
    pub path: PathBuf,

    /// Index to render; omit to render every index
    #[arg(long)]
    pub index: Option<String>,
}

/// Execute render
pub fn execute(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, _store, _summary) = build_from_seed(&args.path)?;

    let targets = match args.index {
        Some(index_id) => vec![index_id],
        None => registry.index_ids(),
    };

    for index_id in targets {
        let rendered = registry.with_state(&index_id, |state| render_index(state, &index_id))?;
        print!("{}", rendered);
        println!();
    }

    Ok(())
}
