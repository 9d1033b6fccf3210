//! Governance data model: proposals, ballots, vote records and ledger entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Address, Amount, CompactSignature, Timestamp, TypesError};

/// Key a proposal is voted on. Distinct from the proposal's display identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteId(String);

impl VoteId {
    pub fn new(id: impl Into<String>) -> Result<Self, TypesError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypesError::EmptyVoteId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for VoteId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A voter's choice. Encoded as `"0"` / `"1"` on the wire and in signed messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Against,
    For,
}

impl Decision {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Against => "0",
            Self::For => "1",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Decision {
    type Err = TypesError;

    /// Accepts the wire token or a human spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "for" | "yes" | "affirm" => Ok(Self::For),
            "0" | "against" | "no" | "oppose" => Ok(Self::Against),
            other => Err(TypesError::InvalidDecision(other.to_string())),
        }
    }
}

/// A funding proposal as published by the coordination service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub vote_id: VoteId,
    pub name: String,
    /// Address receiving the requested funds.
    pub address: Address,
    pub amount: Amount,
    pub details: String,
    /// Funding transaction id; empty until paid out.
    pub txid: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub votes_affirm: u64,
    pub votes_oppose: u64,
}

impl Proposal {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.end_time
    }
}

/// One signed vote for one address. Built per cast attempt, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    pub vote_id: VoteId,
    pub address: Address,
    pub signature: CompactSignature,
    pub decision: Decision,
}

/// A counted vote as reported back by the coordination service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub vote_id: VoteId,
    pub address: Address,
    pub weight: Amount,
}

/// Local proof that this wallet has voted on `vote_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceEntry {
    pub vote_id: VoteId,
    pub weight: Amount,
    pub recorded_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_tokens() {
        assert_eq!(Decision::For.token(), "1");
        assert_eq!(Decision::Against.token(), "0");
        assert_eq!("1".parse::<Decision>().unwrap(), Decision::For);
        assert_eq!("Against".parse::<Decision>().unwrap(), Decision::Against);
        assert!("2".parse::<Decision>().is_err());
    }

    #[test]
    fn vote_id_rejects_empty() {
        assert_eq!(VoteId::new(""), Err(TypesError::EmptyVoteId));
        assert_eq!(VoteId::new("prop-7").unwrap().as_str(), "prop-7");
    }

    #[test]
    fn proposal_expiry() {
        let p = Proposal {
            id: "7".into(),
            vote_id: VoteId::new("prop-7").unwrap(),
            name: "Marketing".into(),
            address: Address::from("addr"),
            amount: Amount::from_coins(10),
            details: String::new(),
            txid: String::new(),
            start_time: Timestamp::new(100),
            end_time: Timestamp::new(200),
            votes_affirm: 0,
            votes_oppose: 0,
        };
        assert!(!p.is_expired(Timestamp::new(200)));
        assert!(p.is_expired(Timestamp::new(201)));
    }
}
