//! LMDB storage backend for the local governance ledger.
//!
//! Implements the traits from `stakegov-store` using the `heed` LMDB bindings.
//! All databases live in a single environment under the wallet's data directory.

pub mod environment;
pub mod error;
pub mod governance;
pub mod integrity;
pub mod meta;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use governance::LmdbGovernanceStore;
pub use meta::LmdbMetaStore;
