//! A file-backed staking wallet for governance voting.
//!
//! Provides what the voting client needs from a wallet:
//! - Key generation and import, encrypted at rest (Argon2id + AES-256-GCM)
//! - Lock/unlock of signing keys
//! - Ownership checks and the staking transaction history
//! - A sync gate backed by a full node's JSON-RPC interface

pub mod error;
pub mod keystore;
pub mod node;
pub mod wallet;

pub use error::WalletError;
pub use keystore::{
    decrypt_keystore, encrypt_keystore, load_keystore, save_keystore, KdfParams, KeystoreFile,
};
pub use node::{ChainInfo, NodeClient};
pub use wallet::{KeyKind, Wallet};
