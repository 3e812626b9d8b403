//! figcap CLI - image-caption pair mining.
//!
//! Provides commands for:
//! - `extract`: Print the caption mapping of one markup file
//! - `run`: Process an archive directory into image-caption pairs
//! - `stats`: Report caption lengths of an output directory

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ExtractArgs, RunArgs, StatsArgs};
use output::Output;

/// figcap - mine image-caption pairs from paper sources.
#[derive(Parser)]
#[command(name = "figcap", version, about)]
struct Cli {
    /// Enable verbose output (per-document warnings and run summary logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the caption mapping of one markup file as JSON.
    Extract(ExtractArgs),
    /// Extract and package pairs for every paper of an archive.
    Run(RunArgs),
    /// Report caption length statistics of an output directory.
    Stats(StatsArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Extract(args) => args.execute(),
        Commands::Run(args) => args.execute(),
        Commands::Stats(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
