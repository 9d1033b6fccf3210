//! secp256k1 key handling.

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use stakegov_types::{KeyId, PrivateKey, PublicKey};

use crate::{hash160, CryptoError};

/// Generate a fresh compressed private key.
pub fn generate_private_key() -> PrivateKey {
    let signing_key = SigningKey::random(&mut rand::thread_rng());
    PrivateKey::new(signing_key.to_bytes().into())
}

/// Validate secret bytes as a secp256k1 scalar.
pub fn private_key_from_bytes(secret: [u8; 32], compressed: bool) -> Result<PrivateKey, CryptoError> {
    SigningKey::from_slice(&secret).map_err(|_| CryptoError::InvalidPrivateKey)?;
    Ok(if compressed {
        PrivateKey::new(secret)
    } else {
        PrivateKey::new_uncompressed(secret)
    })
}

pub(crate) fn signing_key(key: &PrivateKey) -> Result<SigningKey, CryptoError> {
    SigningKey::from_slice(key.secret_bytes()).map_err(|_| CryptoError::InvalidPrivateKey)
}

pub(crate) fn encode_verifying_key(key: &VerifyingKey, compressed: bool) -> Result<PublicKey, CryptoError> {
    let point = k256::PublicKey::from(key).to_encoded_point(compressed);
    PublicKey::from_slice(point.as_bytes()).map_err(|_| CryptoError::InvalidPublicKey)
}

/// Public key for `key`, in the encoding the key is flagged with.
pub fn public_key(key: &PrivateKey) -> Result<PublicKey, CryptoError> {
    let signing_key = signing_key(key)?;
    encode_verifying_key(signing_key.verifying_key(), key.is_compressed())
}

pub fn key_id(public_key: &PublicKey) -> KeyId {
    KeyId(hash160(public_key.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_is_compressed() {
        let key = generate_private_key();
        let pk = public_key(&key).unwrap();
        assert!(pk.is_compressed());
        assert!(matches!(pk.as_bytes()[0], 0x02 | 0x03));
    }

    #[test]
    fn uncompressed_encoding() {
        let key = private_key_from_bytes([1u8; 32], false).unwrap();
        let pk = public_key(&key).unwrap();
        assert_eq!(pk.as_bytes().len(), 65);
        assert_eq!(pk.as_bytes()[0], 0x04);
    }

    #[test]
    fn zero_scalar_rejected() {
        assert_eq!(
            private_key_from_bytes([0u8; 32], true).err(),
            Some(CryptoError::InvalidPrivateKey)
        );
    }

    #[test]
    fn key_id_of_scalar_one() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = private_key_from_bytes(secret, true).unwrap();
        let id = key_id(&public_key(&key).unwrap());
        assert_eq!(id.to_string(), "751e76e8199196d454941c45d1b3a323f1433bd6");
    }
}
