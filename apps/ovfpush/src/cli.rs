//! Subcommands.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use ovfpush_descriptor::Descriptor;
use ovfpush_import::ImportConfig;

#[derive(Parser)]
#[command(
    name = "ovfpush",
    version,
    about = "Import OVF packages into a vSphere inventory"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check an import configuration file
    Validate {
        /// Path to the TOML config file
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the descriptor as it would be submitted for import
    Normalize {
        /// Path to the TOML config file
        #[arg(long)]
        config: PathBuf,
        /// The `.ovf` to rewrite
        ovf: PathBuf,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Validate { config } => validate(&config),
        Command::Normalize {
            config,
            ovf,
            output,
        } => normalize(&config, &ovf, output.as_deref()),
    }
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let config = ImportConfig::load(path)
        .and_then(ImportConfig::validated)
        .with_context(|| format!("invalid config {}", path.display()))?;

    info!(
        host = %config.host,
        datacenter = %config.datacenter,
        folder = %config.folder_path(),
        "configuration is valid"
    );
    Ok(())
}

fn normalize(config: &Path, ovf: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let config = ImportConfig::load(config)
        .with_context(|| format!("failed to load config {}", config.display()))?;
    let descriptor = Descriptor::load(ovf, &config.normalize_options())
        .with_context(|| format!("failed to load descriptor {}", ovf.display()))?;

    info!(
        entity = %config.spec_params(descriptor.envelope()).entity_name,
        "descriptor normalized"
    );

    match output {
        Some(path) => std::fs::write(path, descriptor.content())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout().write_all(descriptor.content().as_bytes())?,
    }
    Ok(())
}
