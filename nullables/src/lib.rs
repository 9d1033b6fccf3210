//! Nullable infrastructure for deterministic testing.
//!
//! Every external dependency of the voting client (clock, coordination
//! service, wallet, ledger storage) sits behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod store;
pub mod transport;
pub mod wallet;

pub use clock::NullClock;
pub use store::NullGovernanceStore;
pub use transport::NullTransport;
pub use wallet::NullWallet;
