//! Compact recoverable ECDSA signatures over 32-byte digests.
//!
//! Layout: one header byte `27 + recovery_id (+ 4 if the key is compressed)`
//! followed by the 64-byte `r || s`. Signatures are RFC 6979 deterministic
//! and low-S normalized.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use stakegov_types::{CompactSignature, KeyId, PrivateKey, PublicKey};

use crate::keys::{encode_verifying_key, key_id, signing_key};
use crate::CryptoError;

const HEADER_BASE: u8 = 27;
const COMPRESSED_FLAG: u8 = 4;

/// Sign a digest with a compressed key.
pub fn sign_compact(hash: &[u8; 32], key: &PrivateKey) -> Result<CompactSignature, CryptoError> {
    if !key.is_compressed() {
        return Err(CryptoError::UncompressedKey);
    }
    let signing_key = signing_key(key)?;
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(hash)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    let mut out = [0u8; CompactSignature::LEN];
    out[0] = HEADER_BASE + recovery_id.to_byte() + COMPRESSED_FLAG;
    out[1..].copy_from_slice(&signature.to_bytes());
    Ok(CompactSignature(out))
}

/// Recover the public key that produced `signature` over `hash`.
pub fn recover_compact(hash: &[u8; 32], signature: &CompactSignature) -> Result<PublicKey, CryptoError> {
    let header = signature.header();
    if !(HEADER_BASE..HEADER_BASE + 2 * COMPRESSED_FLAG).contains(&header) {
        return Err(CryptoError::InvalidHeader(header));
    }
    let flags = header - HEADER_BASE;
    let compressed = flags >= COMPRESSED_FLAG;
    let recovery_id =
        RecoveryId::from_byte(flags & 0x03).ok_or(CryptoError::InvalidHeader(header))?;
    let sig = Signature::from_slice(&signature.as_bytes()[1..])
        .map_err(|_| CryptoError::InvalidSignature)?;
    let verifying_key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|_| CryptoError::InvalidSignature)?;
    encode_verifying_key(&verifying_key, compressed)
}

/// True when `signature` over `hash` recovers to a key with id `expected`.
pub fn verify_compact(hash: &[u8; 32], signature: &CompactSignature, expected: &KeyId) -> bool {
    recover_compact(hash, signature)
        .map(|pk| key_id(&pk) == *expected)
        .unwrap_or(false)
}
