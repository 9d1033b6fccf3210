//! Cryptographic primitives for stake governance voting.
//!
//! - **secp256k1** keys and compact recoverable ECDSA signatures
//! - **sha256d / hash160** for message digests and key identifiers
//! - Signed-message framing (network magic prefix, compact-size lengths)
//! - Address codecs: base58check for legacy outputs, bech32 for witness v0

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod message;
pub mod sign;

pub use address::{decode_address, encode_destination};
pub use error::CryptoError;
pub use hash::{hash160, sha256, sha256d};
pub use keys::{generate_private_key, key_id, private_key_from_bytes, public_key};
pub use message::signed_message_hash;
pub use sign::{recover_compact, sign_compact, verify_compact};
