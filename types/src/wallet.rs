//! Wallet transaction records as seen across the wallet boundary.

use serde::{Deserialize, Serialize};

use crate::{Amount, Script, Timestamp, TxId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Script,
}

/// A transaction relevant to the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTx {
    pub txid: TxId,
    pub time: Timestamp,
    /// True for stake-producing (coinstake) transactions.
    #[serde(default)]
    pub is_coinstake: bool,
    #[serde(default = "default_true")]
    pub in_main_chain: bool,
    /// Reward the stake produced; what a witness-pubkey-hash output contributes to weight.
    #[serde(default)]
    pub stake_reward: Amount,
    pub outputs: Vec<TxOut>,
}

fn default_true() -> bool {
    true
}
