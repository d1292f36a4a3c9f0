//! Registry configuration derived from the command line.

use std::path::PathBuf;

use metamerkles_core::crypto::sha256;
use metamerkles_core::PublisherId;
use metamerkles_registry::RegistryConfig;

use crate::cli::Cli;

/// Seed of the escrow account used by locally opened registries.
const ESCROW_SEED: &[u8] = b"metamerkles/escrow/v1";

/// Fully resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Directory holding the RocksDB database.
    pub data_dir: PathBuf,
    /// Registry settings.
    pub registry: RegistryConfig,
}

impl CliConfig {
    /// Create configuration from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        let registry = RegistryConfig::default()
            .with_scheme(cli.scheme.into())
            .with_prefix_len(cli.prefix_len)
            .with_cascade_metadata(cli.cascade_metadata)
            .with_escrow(escrow_account());

        Self {
            data_dir: cli.expanded_data_dir(),
            registry,
        }
    }

    /// Path of the registry database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("registry")
    }
}

/// Escrow account holding storage fees. Nobody holds its key.
pub fn escrow_account() -> PublisherId {
    PublisherId(sha256(ESCROW_SEED))
}
