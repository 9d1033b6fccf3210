use stakegov_store::StoreError;
use stakegov_types::{Amount, VoteId};
use thiserror::Error;

/// Everything a vote cast or proposal fetch can fail with. None of these are
/// retried internally.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("wallet is not synchronized with the network")]
    NotSynced,

    #[error("no staking addresses are eligible to vote")]
    NoEligibleAddresses,

    #[error("already voted on {vote_id} with weight {weight}")]
    AlreadyVoted { vote_id: VoteId, weight: Amount },

    #[error("cannot resolve an address for script {0}")]
    AddressResolution(String),

    #[error("no private key available for {0}")]
    KeyUnavailable(String),

    #[error("signing for {address} failed: {reason}")]
    Signing { address: String, reason: String },

    #[error("request to the coordination service failed")]
    RequestFailed,

    #[error("the coordination service counted no weight for {0}")]
    ZeroWeightCounted(VoteId),

    #[error("a vote on {vote_id} is already recorded with weight {weight}")]
    DuplicateVote { vote_id: VoteId, weight: Amount },

    #[error("vote submission timed out; the vote may or may not have been counted")]
    OutcomeUnknown,

    #[error("timed out waiting for the coordination service")]
    TimedOut,

    #[error("operation cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GovernanceError {
    fn from(e: serde_json::Error) -> Self {
        GovernanceError::Serialization(e.to_string())
    }
}
