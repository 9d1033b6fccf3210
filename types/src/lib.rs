//! Fundamental types for off-chain stake governance voting.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! amounts, timestamps, scripts and destinations, addresses, network parameters,
//! key material, the governance data model and wallet transaction records.

pub mod address;
pub mod amount;
pub mod error;
pub mod governance;
pub mod hash;
pub mod keys;
pub mod network;
pub mod script;
pub mod time;
pub mod wallet;

pub use address::Address;
pub use amount::{Amount, COIN};
pub use error::TypesError;
pub use governance::{Ballot, Decision, GovernanceEntry, Proposal, VoteId, VoteRecord};
pub use hash::TxId;
pub use keys::{CompactSignature, KeyId, PrivateKey, PublicKey};
pub use network::NetworkId;
pub use script::{Destination, Script, ScriptKind};
pub use time::{Clock, SystemClock, Timestamp};
pub use wallet::{TxOut, WalletTx};
