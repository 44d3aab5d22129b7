//! docdex CLI
//!
//! Command-line interface for the docdex indexing engine

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "docdex")]
#[command(about = "docdex - document index-tree rebuild engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a seed file and build its indexes
    Seed(commands::seed::SeedArgs),
    /// Render an index's instance tree to Markdown
    Render(commands::render::RenderArgs),
    /// Print an index's snapshot manifest and digests
    Snapshot(commands::snapshot::SnapshotArgs),
}

fn main() {
    docdex_core::logging_facility::init(docdex_core::logging_facility::Profile::Development);

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Seed(args) => commands::seed::execute(args),
        Commands::Render(args) => commands::render::execute(args),
        Commands::Snapshot(args) => commands::snapshot::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
