//! The wallet boundary the voting client consumes.
//!
//! Key storage and signing stay inside the wallet. The governance code only
//! learns which scripts are owned and asks for signatures over digests.

use stakegov_types::{CompactSignature, Destination, KeyId, NetworkId, Script, WalletTx};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("wallet is locked")]
    Locked,

    #[error("private key not held by this wallet")]
    KeyNotFound,

    #[error("signing declined: {0}")]
    Declined(String),
}

/// Map a destination to the id of the key that can spend it, if any.
///
/// Script-hash destinations have no single signing key.
pub fn key_id_for_destination(dest: &Destination) -> Option<KeyId> {
    match dest {
        Destination::PubKey(pk) => Some(KeyId(stakegov_crypto::hash160(pk.as_bytes()))),
        Destination::PubKeyHash(h) | Destination::WitnessPubKeyHash(h) => Some(KeyId(*h)),
        Destination::ScriptHash(_) | Destination::WitnessScriptHash(_) => None,
    }
}

pub trait StakeWallet: Send + Sync {
    fn network(&self) -> NetworkId;

    /// Whether the wallet's view of the chain is current enough to vote.
    fn is_synced(&self) -> bool;

    /// Every transaction the wallet tracks, in wallet order.
    fn transactions(&self) -> Vec<WalletTx>;

    fn is_mine(&self, script: &Script) -> bool;

    fn key_id_for(&self, dest: &Destination) -> Option<KeyId> {
        key_id_for_destination(dest)
    }

    /// Produce a compact recoverable signature over `hash` with the key `key_id`.
    fn sign_message_hash(
        &self,
        key_id: &KeyId,
        hash: &[u8; 32],
    ) -> Result<CompactSignature, SignError>;
}
