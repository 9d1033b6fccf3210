//! Which owned scripts may vote, and how much stake backs them.

use std::collections::HashSet;

use stakegov_crypto::hash160;
use stakegov_types::{Amount, Destination, Script, ScriptKind, Timestamp};
use tracing::debug;

use crate::StakeWallet;

/// 30 days of eligibility, 15 days of voting, 1 day of slack.
pub const DEFAULT_ELIGIBILITY_WINDOW_SECS: u64 = 46 * 86_400;

fn is_votable(script: &Script) -> bool {
    let kind = script.kind();
    kind != ScriptKind::NonStandard && !kind.is_script_hash_family()
}

/// The script a ballot for `script` is addressed to. A bare public key
/// votes as the pubkey-hash address of that key.
fn ballot_script(script: &Script) -> Script {
    match script.destination() {
        Some(Destination::PubKey(pk)) => {
            Script::from_destination(&Destination::PubKeyHash(hash160(pk.as_bytes())))
        }
        _ => script.clone(),
    }
}

/// Owned output scripts of staking transactions inside the window ending at
/// `now`, one per ballot address, in first-seen order.
///
/// Script-hash outputs and non-standard outputs are never returned. An empty
/// result is not an error here.
pub fn collect(wallet: &dyn StakeWallet, window_secs: u64, now: Timestamp) -> Vec<Script> {
    let cutoff = now.saturating_sub_secs(window_secs);
    let mut seen = HashSet::new();
    let mut scripts = Vec::new();

    for tx in wallet.transactions() {
        if !tx.is_coinstake || tx.time < cutoff {
            continue;
        }
        for out in &tx.outputs {
            let script = &out.script_pubkey;
            if !is_votable(script) || !wallet.is_mine(script) {
                continue;
            }
            if seen.insert(ballot_script(script)) {
                scripts.push(script.clone());
            }
        }
    }

    debug!(count = scripts.len(), cutoff = cutoff.as_secs(), "collected eligible scripts");
    scripts
}

/// Stake weight the wallet earned between `start` and `end` inclusive.
///
/// Each owned, votable output of a main-chain staking transaction counts
/// once: witness-pubkey-hash outputs contribute the transaction's stake
/// reward, every other output its own value.
pub fn estimate_weight(wallet: &dyn StakeWallet, start: Timestamp, end: Timestamp) -> Amount {
    wallet
        .transactions()
        .iter()
        .filter(|tx| tx.is_coinstake && tx.in_main_chain && tx.time >= start && tx.time <= end)
        .flat_map(|tx| {
            tx.outputs
                .iter()
                .filter(|out| is_votable(&out.script_pubkey) && wallet.is_mine(&out.script_pubkey))
                .map(move |out| match out.script_pubkey.kind() {
                    ScriptKind::PayToWitnessPubKeyHash => tx.stake_reward,
                    _ => out.value,
                })
        })
        .sum()
}
