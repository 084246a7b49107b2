//! # Seed Subcommand
//!
//! Emits the demo directory (users and starter complaints) as YAML, in the
//! format the server reads from `DIRECTORY_SEED`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use civic_api::bootstrap::demo_seed;

/// Arguments for `civic seed`.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn render() -> Result<String> {
    serde_yaml::to_string(&demo_seed()).context("failed to encode demo seed")
}

pub fn run_seed(args: &SeedArgs) -> Result<u8> {
    let yaml = render()?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &yaml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "demo seed written");
        }
        None => print!("{yaml}"),
    }
    Ok(0)
}
