use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid compact signature header: {0}")]
    InvalidHeader(u8),

    #[error("compact signing requires a compressed key")]
    UncompressedKey,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("address checksum mismatch")]
    Checksum,

    #[error("address belongs to another network: {0}")]
    WrongNetwork(String),
}
