//! Coro CLI - list node kinds, check patches and render them offline.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coro")]
#[command(author, version, about = "Coro synthesis toolkit CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List node kinds and their parameters
    Nodes(commands::nodes::NodesArgs),

    /// Validate a patch file
    Check(commands::check::CheckArgs),

    /// Render a patch to a WAV file
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Nodes(args) => commands::nodes::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
