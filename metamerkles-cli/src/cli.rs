//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use metamerkles_core::RootType;
use metamerkles_registry::TagScheme;

/// MetaMerkles registry tool.
#[derive(Parser, Debug, Clone)]
#[command(name = "metamerkles")]
#[command(about = "Publish Merkle roots with metadata and verify membership against them")]
#[command(version)]
pub struct Cli {
    /// Data directory for the registry database.
    #[arg(long, global = true, default_value = "~/.metamerkles")]
    pub data_dir: PathBuf,

    /// Type tag scheme of the registry.
    #[arg(long, global = true, value_enum, default_value_t = SchemeArg::ListTags)]
    pub scheme: SchemeArg,

    /// Delete all metadata of a root when the root is deleted.
    #[arg(long, global = true)]
    pub cascade_metadata: bool,

    /// Bytes of publisher id and root kept in metadata keys (1-32).
    #[arg(long, global = true, default_value_t = 16)]
    pub prefix_len: usize,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Tag scheme selector.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemeArg {
    /// Schema and list-type tags.
    ListTags,
    /// Closed root type tag.
    RootType,
}

impl From<SchemeArg> for TagScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::ListTags => TagScheme::ListTags,
            SchemeArg::RootType => TagScheme::RootType,
        }
    }
}

/// Closed root type selector.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootTypeArg {
    /// Any kind of leaf.
    Mixed,
    /// Asset ids.
    Asset,
    /// 32-byte addresses.
    Address,
    /// Application ids.
    App,
}

impl From<RootTypeArg> for RootType {
    fn from(arg: RootTypeArg) -> Self {
        match arg {
            RootTypeArg::Mixed => RootType::Mixed,
            RootTypeArg::Asset => RootType::Asset,
            RootTypeArg::Address => RootType::Address,
            RootTypeArg::App => RootType::App,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    // === Offline Commands ===
    /// Generate a new publisher keypair.
    Keygen {
        /// Write the secret key to this file, encrypted with a password.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Key file password. Prompted for when omitted.
        #[arg(long, requires = "out")]
        password: Option<String>,

        /// Output in JSON format.
        #[arg(long)]
        json: bool,
    },

    /// Build a sorted-pair Merkle tree and print its root and proofs.
    BuildTree {
        /// Leaves, one argument each.
        #[arg(required = true)]
        leaves: Vec<String>,

        /// Leaves are hex encoded rather than UTF-8 text.
        #[arg(long)]
        hex: bool,

        /// Output in JSON format.
        #[arg(long)]
        json: bool,
    },

    // === Ledger Commands ===
    /// Credit an account on the local ledger.
    Fund {
        /// Account (publisher public key, hex).
        #[arg(long)]
        account: String,

        /// Amount to credit.
        #[arg(long)]
        amount: u64,
    },

    /// Show an account balance.
    Balance {
        /// Account (publisher public key, hex).
        #[arg(long)]
        account: String,
    },

    // === Publisher Commands ===
    /// Publish a root. The exact storage fee is paid from the publisher.
    AddRoot {
        #[command(flatten)]
        signer: SignerArgs,

        /// Merkle root (hex).
        #[arg(long)]
        root: String,

        #[command(flatten)]
        tags: TagArgs,
    },

    /// Withdraw a root and reclaim its fee.
    DeleteRoot {
        #[command(flatten)]
        signer: SignerArgs,

        /// Merkle root (hex).
        #[arg(long)]
        root: String,
    },

    /// Attach a metadata record to a root.
    AddData {
        #[command(flatten)]
        signer: SignerArgs,

        /// Merkle root (hex).
        #[arg(long)]
        root: String,

        /// Metadata key.
        #[arg(long)]
        name: String,

        #[command(flatten)]
        value: ValueArgs,
    },

    /// Remove a metadata record and reclaim its fee.
    DeleteData {
        #[command(flatten)]
        signer: SignerArgs,

        /// Merkle root (hex).
        #[arg(long)]
        root: String,

        /// Metadata key.
        #[arg(long)]
        name: String,
    },

    // === Reader Commands ===
    /// Read a metadata record without a proof.
    Read {
        #[command(flatten)]
        target: TargetArgs,

        /// Metadata key. Lists every record when omitted.
        #[arg(long)]
        name: Option<String>,
    },

    /// Check that a leaf is a member of a published root.
    Verify {
        #[command(flatten)]
        target: TargetArgs,

        /// Proof (hex concatenated sibling hashes, may be empty).
        #[arg(long, default_value = "")]
        proof: String,

        #[command(flatten)]
        leaf: LeafArgs,
    },

    /// Read a metadata record after proving a leaf and checking root tags.
    VerifiedRead {
        #[command(flatten)]
        target: TargetArgs,

        /// Proof (hex concatenated sibling hashes, may be empty).
        #[arg(long, default_value = "")]
        proof: String,

        #[command(flatten)]
        leaf: LeafArgs,

        /// Metadata key.
        #[arg(long)]
        name: String,

        // Omitted list tags mean "don't care".
        #[command(flatten)]
        expect: TagArgs,
    },
}

/// The publisher key signing a mutation.
#[derive(Args, Debug, Clone)]
pub struct SignerArgs {
    /// Encrypted key file written by `keygen --out`.
    #[arg(long)]
    pub key: PathBuf,

    /// Key file password. Prompted for when omitted.
    #[arg(long)]
    pub password: Option<String>,
}

/// Root tags, either list tags or a root type.
#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    /// Schema tag.
    #[arg(long, default_value_t = 0, conflicts_with = "root_type")]
    pub schema: u64,

    /// List type tag.
    #[arg(long, default_value_t = 0, conflicts_with = "root_type")]
    pub list_type: u64,

    /// Root type tag.
    #[arg(long, value_enum)]
    pub root_type: Option<RootTypeArg>,
}

/// A metadata value.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ValueArgs {
    /// UTF-8 value.
    #[arg(long)]
    pub value: Option<String>,

    /// Hex value.
    #[arg(long)]
    pub value_hex: Option<String>,

    /// 8-byte big-endian integer value.
    #[arg(long)]
    pub value_u64: Option<u64>,
}

/// The root being read or verified.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Publisher public key (hex).
    #[arg(long)]
    pub publisher: String,

    /// Merkle root (hex).
    #[arg(long)]
    pub root: String,
}

/// The leaf being proven, in one of its encodings.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct LeafArgs {
    /// UTF-8 leaf.
    #[arg(long)]
    pub leaf: Option<String>,

    /// Hex leaf.
    #[arg(long)]
    pub leaf_hex: Option<String>,

    /// Asset id leaf (typed verification).
    #[arg(long)]
    pub asset: Option<u64>,

    /// Address leaf, hex (typed verification).
    #[arg(long)]
    pub address: Option<String>,

    /// Application id leaf (typed verification).
    #[arg(long)]
    pub app: Option<u64>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Expand the data directory path (handle ~ for home).
    pub fn expanded_data_dir(&self) -> PathBuf {
        let path_str = self.data_dir.to_string_lossy();
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        self.data_dir.clone()
    }
}
