//! Off-chain governance voting for staking wallets.
//!
//! A coordination service publishes funding proposals. The wallet proves it
//! controls recently staking outputs by signing one ballot per owned address,
//! submits the batch, and records the weight the service reports back so the
//! same proposal cannot be voted on twice.
//!
//! Flow: [`ProposalCache`] decides when to refresh → [`GovernanceClient`]
//! fetches proposals → [`eligibility::collect`] finds eligible scripts →
//! [`GovernanceLedger`] rejects repeat votes → [`BallotSigner`] signs →
//! [`GovernanceClient`] submits → [`aggregate::tally`] sums the weight →
//! [`GovernanceLedger`] persists it. [`VotingService`] drives the whole cast.

pub mod aggregate;
pub mod ballot;
pub mod cache;
pub mod client;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod http;
pub mod ledger;
pub mod service;
pub mod transport;
pub mod wallet;

pub use aggregate::{aggregate_weight, tally, Tally};
pub use ballot::{ballot_message, BallotSigner, WireBallot};
pub use cache::{matches_filter, CacheState, ProposalCache, Tick};
pub use client::{GovernanceClient, Request};
pub use config::GovernanceConfig;
pub use error::GovernanceError;
pub use http::HttpTransport;
pub use ledger::GovernanceLedger;
pub use service::{CastReceipt, VotingService};
pub use transport::{CoordinationTransport, TransportError};
pub use wallet::{key_id_for_destination, SignError, StakeWallet};
