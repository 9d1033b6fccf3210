//! Transport boundary to the coordination service.

use async_trait::async_trait;
use stakegov_types::{Proposal, VoteRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("coordination service unreachable: {0}")]
    Unreachable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request may have reached the service; its outcome is unknown.
    #[error("request timed out after it was sent: {0}")]
    TimedOut(String),
}

/// One round trip per request type. Implementations do not retry.
#[async_trait]
pub trait CoordinationTransport: Send + Sync {
    /// GET_PROPOSALS: the current proposal list.
    async fn get_proposals(&self) -> Result<Vec<Proposal>, TransportError>;

    /// CAST_VOTE: submit a JSON ballot array, receive the counted vote records.
    async fn cast_votes(&self, payload: &str) -> Result<Vec<VoteRecord>, TransportError>;
}
