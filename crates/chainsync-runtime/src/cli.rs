//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chainsyncd", about = "multi-chain event synchronizer daemon")]
pub struct Cli {
    /// Config file path (default: $CHAINSYNC_CONFIG or ./chainsync.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the daemon (relay listeners + sync pipelines)
    Run,
    /// Validate the config file and print the resolved sources
    Check,
}

/// Default config path, overridable via CHAINSYNC_CONFIG.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHAINSYNC_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("chainsync.toml")
}
