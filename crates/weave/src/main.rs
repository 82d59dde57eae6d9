//! Weave CLI - embed resolution for markdown documents.
//!
//! Provides commands for:
//! - `render`: Render documents with their embeds resolved
//! - `settings show|set|reset`: Inspect and change render settings
//! - `cache clear`: Drop all cached content

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CacheCommand, RenderArgs, SettingsCommand};
use error::CliError;
use output::Output;

/// Weave - embed resolution for markdown documents.
#[derive(Parser)]
#[command(name = "weave", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render documents to HTML on stdout.
    Render(RenderArgs),
    /// Render settings commands.
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Content cache commands.
    #[command(subcommand)]
    Cache(CacheCommand),
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
        Commands::Render(args) => run_async(args),
        Commands::Settings(cmd) => cmd.execute(),
        Commands::Cache(cmd) => cmd.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Render on a single-threaded runtime.
fn run_async(args: RenderArgs) -> Result<(), CliError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(args.execute())
}
