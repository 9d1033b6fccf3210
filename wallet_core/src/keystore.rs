//! Argon2id encrypted keystore.
//!
//! Seals an arbitrary secret payload (the wallet's serialized signing keys)
//! under a user-chosen password:
//! 1. Argon2id derives a 32-byte encryption key from the password + random salt
//! 2. AES-256-GCM encrypts the payload with a random nonce
//! 3. The result carries every parameter needed to decrypt it later

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use zeroize::Zeroizing;

use crate::error::WalletError;

const KEYSTORE_VERSION: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

/// Salt length in bytes.
const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreFile {
    pub version: u32,
    pub crypto: KeystoreCrypto,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded salt.
    pub salt: String,
    /// Hex-encoded nonce.
    pub nonce: String,
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
}

/// Argon2id cost parameters, stored alongside the ciphertext.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MB memory, 3 iterations, 1 lane.
    fn default() -> Self {
        Self {
            memory: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Minimal cost, for tests and throwaway wallets.
    pub fn insecure_fast() -> Self {
        Self {
            memory: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Encrypt `plaintext` with a password using Argon2id + AES-256-GCM.
pub fn encrypt_keystore(
    plaintext: &[u8],
    password: &str,
    params: KdfParams,
) -> Result<KeystoreFile, WalletError> {
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(password, &salt, params)?;
    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| WalletError::Key(format!("AES key init failed: {e}")))?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| WalletError::Key(format!("encryption failed: {e}")))?;

    Ok(KeystoreFile {
        version: KEYSTORE_VERSION,
        crypto: KeystoreCrypto {
            cipher: "aes-256-gcm".to_string(),
            kdf: "argon2id".to_string(),
            kdf_params: params,
            salt: hex::encode(salt),
            nonce: hex::encode(nonce_bytes),
            ciphertext: hex::encode(ciphertext),
        },
    })
}

/// Decrypt a keystore with the given password.
///
/// The returned buffer is wiped when dropped.
pub fn decrypt_keystore(
    keystore: &KeystoreFile,
    password: &str,
) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    if keystore.version != KEYSTORE_VERSION {
        return Err(WalletError::Key(format!(
            "unsupported keystore version: {}",
            keystore.version
        )));
    }
    if keystore.crypto.cipher != "aes-256-gcm" || keystore.crypto.kdf != "argon2id" {
        return Err(WalletError::Key(format!(
            "unsupported keystore scheme: {}/{}",
            keystore.crypto.kdf, keystore.crypto.cipher
        )));
    }

    let salt = hex::decode(&keystore.crypto.salt)
        .map_err(|e| WalletError::Key(format!("invalid salt hex: {e}")))?;
    let nonce_bytes = hex::decode(&keystore.crypto.nonce)
        .map_err(|e| WalletError::Key(format!("invalid nonce hex: {e}")))?;
    let ciphertext = hex::decode(&keystore.crypto.ciphertext)
        .map_err(|e| WalletError::Key(format!("invalid ciphertext hex: {e}")))?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(WalletError::Key(format!(
            "invalid nonce length: expected {NONCE_LEN}, got {}",
            nonce_bytes.len()
        )));
    }

    let derived_key = derive_key(password, &salt, keystore.crypto.kdf_params)?;
    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|e| WalletError::Key(format!("AES key init failed: {e}")))?;

    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
        .map(Zeroizing::new)
        .map_err(|_| WalletError::WrongPassword)
}

/// Save a keystore to a JSON file.
pub fn save_keystore(keystore: &KeystoreFile, path: &Path) -> Result<(), WalletError> {
    let json = serde_json::to_string_pretty(keystore)
        .map_err(|e| WalletError::File(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| WalletError::File(format!("failed to write keystore file: {e}")))
}

/// Load a keystore from a JSON file.
pub fn load_keystore(path: &Path) -> Result<KeystoreFile, WalletError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| WalletError::File(format!("failed to read keystore file: {e}")))?;
    serde_json::from_str(&json).map_err(|e| WalletError::File(format!("invalid keystore JSON: {e}")))
}

fn derive_key(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<Zeroizing<[u8; ARGON2_OUTPUT_LEN]>, WalletError> {
    let params = Params::new(
        params.memory,
        params.iterations,
        params.parallelism,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| WalletError::Key(format!("Argon2 params error: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = Zeroizing::new([0u8; ARGON2_OUTPUT_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output[..])
        .map_err(|e| WalletError::Key(format!("Argon2 hashing failed: {e}")))?;
    Ok(output)
}
