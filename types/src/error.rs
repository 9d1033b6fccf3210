//! Parsing errors for fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid decision token: {0} (expected \"0\" or \"1\")")]
    InvalidDecision(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("empty vote identifier")]
    EmptyVoteId,
}
