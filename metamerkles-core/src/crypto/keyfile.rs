//! Password-protected publisher key files.
//!
//! | Field      | Size | Contents                          |
//! |------------|------|-----------------------------------|
//! | Magic      | 4    | `MMKF`                            |
//! | Version    | 1    | 1                                 |
//! | Salt       | 16   | Argon2id salt                     |
//! | Nonce      | 12   | AES-256-GCM nonce                 |
//! | Ciphertext | 48   | Ed25519 seed (32) + GCM tag (16)  |
//!
//! The magic and version are bound to the ciphertext as associated data,
//! so a file with a rewritten header fails to decrypt.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use thiserror::Error;

use super::KeyPair;

/// Magic bytes identifying a MetaMerkles key file.
pub const KEYFILE_MAGIC: &[u8; 4] = b"MMKF";

/// Current key file format version.
pub const KEYFILE_VERSION: u8 = 1;

const HEADER_LEN: usize = 5;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const SEED_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// Total key file size in bytes.
pub const KEYFILE_LEN: usize = HEADER_LEN + SALT_LEN + NONCE_LEN + SEED_LEN + TAG_LEN;

// Argon2id cost: 19 MiB, 2 passes, 1 lane.
const ARGON2_M_COST: u32 = 19 * 1024;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

/// Errors reading or writing a key file.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyFileError {
    /// The file has the wrong length.
    #[error("key file is {actual} bytes, expected {expected}")]
    WrongLength {
        /// Required length.
        expected: usize,
        /// Length found.
        actual: usize,
    },
    /// The magic bytes are not `MMKF`.
    #[error("not a MetaMerkles key file")]
    InvalidMagic,
    /// The format version is not supported.
    #[error("unsupported key file version {0}")]
    UnsupportedVersion(u8),
    /// Argon2id rejected its parameters.
    #[error("key derivation failed")]
    KeyDerivationFailed,
    /// Wrong password or corrupted file.
    #[error("decryption failed (wrong password or corrupted file)")]
    DecryptionFailed,
    /// AES-GCM refused to encrypt.
    #[error("encryption failed")]
    EncryptionFailed,
}

/// Encrypt `keys` under `password`, returning the key file bytes.
///
/// ```
/// use metamerkles_core::crypto::keyfile::{encrypt_key, KEYFILE_LEN};
/// use metamerkles_core::KeyPair;
///
/// let encrypted = encrypt_key(&KeyPair::generate(), "hunter2").unwrap();
/// assert_eq!(encrypted.len(), KEYFILE_LEN);
/// ```
pub fn encrypt_key(keys: &KeyPair, password: &str) -> Result<Vec<u8>, KeyFileError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    let mut rng = rand::thread_rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut nonce);

    let mut out = Vec::with_capacity(KEYFILE_LEN);
    out.extend_from_slice(KEYFILE_MAGIC);
    out.push(KEYFILE_VERSION);

    let cipher = cipher(password, &salt)?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: keys.secret_bytes(),
                aad: &out[..HEADER_LEN],
            },
        )
        .map_err(|_| KeyFileError::EncryptionFailed)?;

    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    debug_assert_eq!(out.len(), KEYFILE_LEN);
    Ok(out)
}

/// Decrypt a key file produced by [`encrypt_key`].
pub fn decrypt_key(encrypted: &[u8], password: &str) -> Result<KeyPair, KeyFileError> {
    if encrypted.len() != KEYFILE_LEN {
        return Err(KeyFileError::WrongLength {
            expected: KEYFILE_LEN,
            actual: encrypted.len(),
        });
    }
    let (header, body) = encrypted.split_at(HEADER_LEN);
    if &header[..4] != KEYFILE_MAGIC {
        return Err(KeyFileError::InvalidMagic);
    }
    if header[4] != KEYFILE_VERSION {
        return Err(KeyFileError::UnsupportedVersion(header[4]));
    }
    let (salt, rest) = body.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let seed = cipher(password, salt)?
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| KeyFileError::DecryptionFailed)?;
    let seed: [u8; SEED_LEN] = seed
        .try_into()
        .map_err(|_| KeyFileError::DecryptionFailed)?;
    Ok(KeyPair::from_bytes(&seed))
}

/// AES-256-GCM keyed by Argon2id over `password` and `salt`.
fn cipher(password: &str, salt: &[u8]) -> Result<Aes256Gcm, KeyFileError> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|_| KeyFileError::KeyDerivationFailed)?;
    let mut key = [0u8; 32];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|_| KeyFileError::KeyDerivationFailed)?;
    Aes256Gcm::new_from_slice(&key).map_err(|_| KeyFileError::KeyDerivationFailed)
}
