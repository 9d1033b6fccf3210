//! Key material and signature types.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::TypesError;

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;
/// Length of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;

/// A secp256k1 public key in SEC1 encoding (compressed or uncompressed).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        match bytes.len() {
            COMPRESSED_PUBLIC_KEY_LEN | UNCOMPRESSED_PUBLIC_KEY_LEN => Ok(Self(bytes.to_vec())),
            actual => Err(TypesError::InvalidLength {
                expected: COMPRESSED_PUBLIC_KEY_LEN,
                actual,
            }),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_compressed(&self) -> bool {
        self.0.len() == COMPRESSED_PUBLIC_KEY_LEN
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0))
    }
}

/// Hash160 of a public key; the handle a wallet resolves signing keys by.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(pub [u8; 20]);

impl KeyId {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(self.0))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A 32-byte secp256k1 secret scalar plus the encoding its public key uses.
///
/// This type intentionally does not implement `Debug`, `Serialize`, or `Clone`
/// to prevent accidental exposure. Key bytes are zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    secret: [u8; 32],
    #[zeroize(skip)]
    compressed: bool,
}

impl PrivateKey {
    /// A key whose public half is serialized compressed (the usual case).
    pub fn new(secret: [u8; 32]) -> Self {
        Self {
            secret,
            compressed: true,
        }
    }

    /// A legacy key whose public half is serialized uncompressed.
    pub fn new_uncompressed(secret: [u8; 32]) -> Self {
        Self {
            secret,
            compressed: false,
        }
    }

    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

/// A 65-byte compact recoverable ECDSA signature: header byte, then `r || s`.
///
/// The header is `27 + recovery_id`, plus 4 when the signing key is compressed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CompactSignature(pub [u8; 65]);

impl CompactSignature {
    pub const LEN: usize = 65;

    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let arr: [u8; 65] = bytes.try_into().map_err(|_| TypesError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn header(&self) -> u8 {
        self.0[0]
    }
}

impl fmt::Debug for CompactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactSignature({}..)", hex::encode(&self.0[..8]))
    }
}
