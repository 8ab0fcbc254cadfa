//! Deletes leftover `generate-files` artifacts from the output directory.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use repofix::{artifacts, logging, Config};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Delete leftover repofix artifacts", long_about = None)]
struct Cli {
    /// Directory to sweep; defaults to the configured output directory
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// List matching files without deleting them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;
    logging::init(&config.log_level)?;

    let dir = cli.dir.unwrap_or(config.output_dir);
    let matched = artifacts::sweep_artifacts(&dir, cli.dry_run)
        .await
        .with_context(|| format!("failed to sweep {}", dir.display()))?;

    info!("{} artifact(s) matched in {}", matched.len(), dir.display());
    Ok(())
}
