//! MetaMerkles command-line tool.
//!
//! Publishes Merkle roots and their metadata into a local RocksDB-backed
//! registry, and verifies membership proofs against them.
//!
//! # Usage
//!
//! ```bash
//! # Create a password-protected publisher key and fund it
//! metamerkles keygen --out publisher.key
//! metamerkles fund --account <PUBLIC_KEY> --amount 1000000
//!
//! # Build a tree, publish its root, attach a royalty
//! metamerkles build-tree L0 L1 L2 L3
//! metamerkles add-root --key publisher.key --root <ROOT> --schema 1 --list-type 1
//! metamerkles add-data --key publisher.key --root <ROOT> --name royalty --value 5
//!
//! # Read the royalty as a holder of L3
//! metamerkles verified-read --publisher <PUBLIC_KEY> --root <ROOT> \
//!     --proof <PROOF> --leaf L3 --name royalty --schema 1 --list-type 1
//! ```

mod cli;
mod commands;
mod config;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::CliConfig;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Logs go to stderr so command output stays machine readable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::from_cli(&cli);
    tracing::debug!(
        "metamerkles v{} data_dir={}",
        env!("CARGO_PKG_VERSION"),
        config.data_dir.display()
    );

    commands::run(cli.command, &config)
}
