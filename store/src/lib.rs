//! Abstract storage traits for the local governance ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod governance;
pub mod meta;

pub use error::StoreError;
pub use governance::{GovernanceStore, InsertOutcome};
pub use meta::MetaStore;
