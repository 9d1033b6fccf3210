use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is locked")]
    Locked,

    #[error("wrong password or corrupted keystore")]
    WrongPassword,

    #[error("key error: {0}")]
    Key(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("wallet belongs to network {found}, expected {expected}")]
    NetworkMismatch { found: String, expected: String },

    #[error("wallet file error: {0}")]
    File(String),

    #[error("node RPC error: {0}")]
    Node(String),

    #[error("no node connection configured")]
    NoNodeConnection,
}

impl From<stakegov_crypto::CryptoError> for WalletError {
    fn from(e: stakegov_crypto::CryptoError) -> Self {
        WalletError::Key(e.to_string())
    }
}
