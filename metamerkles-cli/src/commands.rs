//! Subcommand implementations.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;

use metamerkles_core::crypto::{decrypt_key, encrypt_key};
use metamerkles_core::merkle::MerkleTree;
use metamerkles_core::{
    Hash, KeyPair, ListType, Operation, Payment, PublisherId, RootTags, SchemaType,
    SignedOperation, TypeConstraint,
};
use metamerkles_registry::{apply_operation, KvLedger, Ledger, Registry};
use metamerkles_storage::RocksBackend;

use crate::cli::{Command, LeafArgs, SignerArgs, TagArgs, TargetArgs, ValueArgs};
use crate::config::CliConfig;

type LocalRegistry = Registry<RocksBackend, KvLedger<RocksBackend>>;

/// Keypair output.
#[derive(Serialize)]
struct KeypairJson {
    /// Public key, which is also the publisher id (64 hex characters).
    public_key: String,
    /// Secret key seed (64 hex characters). Omitted when written to a key
    /// file.
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
    /// Encrypted key file, if one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    key_file: Option<String>,
}

/// Tree output.
#[derive(Serialize)]
struct TreeJson {
    root: String,
    leaves: Vec<LeafJson>,
}

#[derive(Serialize)]
struct LeafJson {
    index: usize,
    leaf: String,
    proof: String,
}

/// A leaf as the registry checks it.
enum Leaf {
    Raw(Vec<u8>),
    Asset(u64),
    Address([u8; 32]),
    App(u64),
}

impl Leaf {
    fn bytes(&self) -> Vec<u8> {
        match self {
            Leaf::Raw(data) => data.clone(),
            Leaf::Asset(id) | Leaf::App(id) => id.to_be_bytes().to_vec(),
            Leaf::Address(addr) => addr.to_vec(),
        }
    }
}

/// Run one subcommand.
pub fn run(command: Command, config: &CliConfig) -> Result<()> {
    match command {
        Command::Keygen { out, password, json } => keygen(out.as_deref(), password.as_deref(), json),
        Command::BuildTree { leaves, hex, json } => build_tree(&leaves, hex, json),
        Command::Fund { account, amount } => {
            let account = parse_account(&account)?;
            let mut registry = open(config)?;
            registry.ledger_mut().mint(&account, amount)?;
            println!("Credited {} with {}", account.to_hex(), amount);
            println!("Balance: {}", registry.ledger().balance(&account)?);
            Ok(())
        }
        Command::Balance { account } => {
            let account = parse_account(&account)?;
            let registry = open(config)?;
            println!("{}", registry.ledger().balance(&account)?);
            Ok(())
        }
        Command::AddRoot { signer, root, tags } => {
            let keys = load_signer(&signer)?;
            let root = parse_hash(&root)?;
            let mut registry = open(config)?;
            let amount = registry.add_root_cost()?;
            let payment = Payment::new(keys.id(), registry.escrow(), amount);
            let tags = root_tags(&tags);
            submit(&mut registry, &keys, Operation::AddRoot { root, tags, payment })?;
            println!("Published root {} (paid {})", hex::encode(root), amount);
            Ok(())
        }
        Command::DeleteRoot { signer, root } => {
            let keys = load_signer(&signer)?;
            let root = parse_hash(&root)?;
            let mut registry = open(config)?;
            let before = registry.ledger().balance(&keys.id())?;
            submit(&mut registry, &keys, Operation::DeleteRoot { root })?;
            let refund = registry.ledger().balance(&keys.id())?.saturating_sub(before);
            println!("Deleted root {} (refunded {})", hex::encode(root), refund);
            Ok(())
        }
        Command::AddData { signer, root, name, value } => {
            let keys = load_signer(&signer)?;
            let root = parse_hash(&root)?;
            let value = parse_value(&value)?;
            let mut registry = open(config)?;
            let amount = registry.add_data_cost(&name, value.len())?;
            let payment = Payment::new(keys.id(), registry.escrow(), amount);
            let op = Operation::AddData {
                root,
                key: name.clone(),
                value,
                payment,
            };
            submit(&mut registry, &keys, op)?;
            println!("Set {} (paid {})", name, amount);
            Ok(())
        }
        Command::DeleteData { signer, root, name } => {
            let keys = load_signer(&signer)?;
            let root = parse_hash(&root)?;
            let mut registry = open(config)?;
            let before = registry.ledger().balance(&keys.id())?;
            let op = Operation::DeleteData {
                root,
                key: name.clone(),
            };
            submit(&mut registry, &keys, op)?;
            let refund = registry.ledger().balance(&keys.id())?.saturating_sub(before);
            println!("Deleted {} (refunded {})", name, refund);
            Ok(())
        }
        Command::Read { target, name } => {
            let (publisher, root) = parse_target(&target)?;
            let registry = open(config)?;
            match name {
                Some(name) => print_value(&registry.read(&publisher, &root, &name)?),
                None => {
                    for (name, value) in registry.list_data(&publisher, &root)? {
                        println!("{}: {}", name, render(&value));
                    }
                }
            }
            Ok(())
        }
        Command::Verify { target, proof, leaf } => {
            let (publisher, root) = parse_target(&target)?;
            let proof = parse_hex(&proof)?;
            let leaf = parse_leaf(&leaf)?;
            let registry = open(config)?;
            let member = match leaf {
                Leaf::Raw(data) => registry.verify(&publisher, &root, &proof, &data)?,
                Leaf::Asset(id) => registry.verify_asset(&publisher, &root, &proof, id)?,
                Leaf::Address(addr) => registry.verify_address(&publisher, &root, &proof, &addr)?,
                Leaf::App(id) => registry.verify_app(&publisher, &root, &proof, id)?,
            };
            println!("{}", if member { "valid" } else { "invalid" });
            if !member {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::VerifiedRead {
            target,
            proof,
            leaf,
            name,
            expect,
        } => {
            let (publisher, root) = parse_target(&target)?;
            let proof = parse_hex(&proof)?;
            let leaf = parse_leaf(&leaf)?.bytes();
            let constraint = constraint(&expect);
            let registry = open(config)?;
            let value = registry.verified_read(&publisher, &root, &proof, &leaf, &name, &constraint)?;
            print_value(&value);
            Ok(())
        }
    }
}

/// Open the on-disk registry, creating it on first use.
fn open(config: &CliConfig) -> Result<LocalRegistry> {
    let path = config.db_path();
    fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create data directory {}", path.display()))?;
    let backend = Arc::new(
        RocksBackend::open(&path).with_context(|| format!("Failed to open database at {}", path.display()))?,
    );
    let ledger = KvLedger::new(Arc::clone(&backend));
    Ok(Registry::new(backend, ledger, config.registry.clone())?)
}

fn submit(registry: &mut LocalRegistry, keys: &KeyPair, op: Operation) -> Result<()> {
    let sequence = registry.next_sequence(&keys.id())?;
    let signed = SignedOperation::sign(op, sequence, keys)?;
    apply_operation(registry, &signed)?;
    Ok(())
}

fn keygen(out: Option<&Path>, password: Option<&str>, json: bool) -> Result<()> {
    let keys = KeyPair::generate();
    let public_key = hex::encode(keys.public_key().as_bytes());

    let (secret_key, key_file) = match out {
        Some(path) => {
            let password = match password {
                Some(password) => password.to_string(),
                None => prompt_password_confirm()?,
            };
            write_key_file(path, &keys, &password)?;
            (None, Some(path.display().to_string()))
        }
        None => (Some(hex::encode(keys.secret_bytes())), None),
    };

    if json {
        let output = KeypairJson {
            public_key,
            secret_key,
            key_file,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("=== MetaMerkles Publisher Keypair ===");
        println!();
        println!("Public Key: {}", public_key);
        if let Some(secret_key) = secret_key {
            println!("Secret Key: {}", secret_key);
        }
        if let Some(key_file) = key_file {
            println!("Saved to:   {}", key_file);
        }
    }
    Ok(())
}

/// Encrypt `keys` into a new file readable only by its owner.
fn write_key_file(path: &Path, keys: &KeyPair, password: &str) -> Result<()> {
    if path.exists() {
        bail!("Key file already exists: {}", path.display());
    }
    let encrypted = encrypt_key(keys, password).context("Failed to encrypt key")?;
    fs::write(path, encrypted)
        .with_context(|| format!("Failed to write key file {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }
    Ok(())
}

fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("Failed to read password")
}

fn prompt_password_confirm() -> Result<String> {
    let first = prompt_password("Enter password: ")?;
    let second = prompt_password("Confirm password: ")?;
    if first != second {
        bail!("Passwords do not match");
    }
    Ok(first)
}

fn build_tree(leaves: &[String], hex_leaves: bool, json: bool) -> Result<()> {
    let data: Vec<Vec<u8>> = leaves
        .iter()
        .map(|leaf| {
            if hex_leaves {
                parse_hex(leaf)
            } else {
                Ok(leaf.as_bytes().to_vec())
            }
        })
        .collect::<Result<_>>()?;
    let tree = MerkleTree::from_leaves(&data);

    let leaves: Vec<LeafJson> = leaves
        .iter()
        .enumerate()
        .map(|(index, leaf)| {
            let proof = tree
                .proof(index)
                .ok_or_else(|| anyhow!("no proof for leaf {}", index))?;
            Ok(LeafJson {
                index,
                leaf: leaf.clone(),
                proof: hex::encode(proof),
            })
        })
        .collect::<Result<_>>()?;
    let output = TreeJson {
        root: hex::encode(tree.root()),
        leaves,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Root: {}", output.root);
        for leaf in &output.leaves {
            println!("  [{}] {} proof={}", leaf.index, leaf.leaf, leaf.proof);
        }
    }
    Ok(())
}

fn root_tags(args: &TagArgs) -> RootTags {
    match args.root_type {
        Some(root_type) => RootTags::Typed(root_type.into()),
        None => RootTags::Listed {
            schema: SchemaType(args.schema),
            list_type: ListType(args.list_type),
        },
    }
}

/// Expected tags for a verified read. No expectations at all means any root
/// type is accepted.
fn constraint(args: &TagArgs) -> TypeConstraint {
    match args.root_type {
        Some(root_type) => TypeConstraint::Typed(root_type.into()),
        None if args.schema == 0 && args.list_type == 0 => TypeConstraint::Unconstrained,
        None => TypeConstraint::listed(args.schema, args.list_type),
    }
}

fn load_signer(signer: &SignerArgs) -> Result<KeyPair> {
    let password = match &signer.password {
        Some(password) => password.clone(),
        None => prompt_password("Enter password: ")?,
    };
    load_key(&signer.key, &password)
}

/// Decrypt the keypair in an encrypted key file.
fn load_key(path: &Path, password: &str) -> Result<KeyPair> {
    let encrypted = fs::read(path)
        .with_context(|| format!("Failed to read key file {}", path.display()))?;
    decrypt_key(&encrypted, password)
        .with_context(|| format!("Failed to decrypt key file {}", path.display()))
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

fn parse_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s)).with_context(|| format!("Invalid hex: {}", s))
}

fn parse_array<const N: usize>(s: &str) -> Result<[u8; N]> {
    let bytes = parse_hex(s)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("Expected {} bytes, got {}", N, len))
}

fn parse_hash(s: &str) -> Result<Hash> {
    parse_array(s)
}

fn parse_account(s: &str) -> Result<PublisherId> {
    Ok(PublisherId(parse_array(s)?))
}

fn parse_target(target: &TargetArgs) -> Result<(PublisherId, Hash)> {
    Ok((parse_account(&target.publisher)?, parse_hash(&target.root)?))
}

fn parse_value(args: &ValueArgs) -> Result<Vec<u8>> {
    match (&args.value, &args.value_hex, args.value_u64) {
        (Some(text), _, _) => Ok(text.as_bytes().to_vec()),
        (_, Some(hex), _) => parse_hex(hex),
        (_, _, Some(n)) => Ok(n.to_be_bytes().to_vec()),
        _ => bail!("A value is required"),
    }
}

fn parse_leaf(args: &LeafArgs) -> Result<Leaf> {
    if let Some(text) = &args.leaf {
        return Ok(Leaf::Raw(text.as_bytes().to_vec()));
    }
    if let Some(hex) = &args.leaf_hex {
        return Ok(Leaf::Raw(parse_hex(hex)?));
    }
    if let Some(id) = args.asset {
        return Ok(Leaf::Asset(id));
    }
    if let Some(addr) = &args.address {
        return Ok(Leaf::Address(parse_array(addr)?));
    }
    if let Some(id) = args.app {
        return Ok(Leaf::App(id));
    }
    bail!("A leaf is required")
}

/// Text when the value is printable UTF-8, hex otherwise.
fn render(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("0x{}", hex::encode(value)),
    }
}

fn print_value(value: &[u8]) {
    println!("{}", render(value));
}
