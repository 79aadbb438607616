//! Patch validation command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use coro_config::{PatchConfig, ValidationError, validate_patch};
use coro_registry::NodeRegistry;

#[derive(Args)]
pub struct CheckArgs {
    /// Patch file (TOML)
    #[arg(value_name = "PATCH")]
    patch: PathBuf,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = PatchConfig::load(&args.patch)
        .with_context(|| format!("loading {}", args.patch.display()))?;

    match validate_patch(&config, &NodeRegistry::new()) {
        Ok(()) => {
            println!(
                "{}: patch '{}' is valid ({} nodes, {} tables, {} matrices)",
                args.patch.display(),
                config.name,
                config.nodes.len(),
                config.tables.len(),
                config.matrices.len()
            );
            Ok(())
        }
        Err(ValidationError::Multiple(errors)) => {
            for error in &errors {
                eprintln!("  {error}");
            }
            anyhow::bail!("{}: {} problems found", args.patch.display(), errors.len())
        }
        Err(error) => anyhow::bail!("{}: {error}", args.patch.display()),
    }
}
