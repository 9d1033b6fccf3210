//! Nullable wallet: in-memory keys and staking history.

use stakegov_crypto::{encode_destination, generate_private_key, key_id, public_key, sign_compact};
use stakegov_governance::{SignError, StakeWallet};
use stakegov_types::{
    Address, Amount, CompactSignature, Destination, KeyId, NetworkId, PrivateKey, Script,
    Timestamp, TxId, TxOut, WalletTx,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A wallet whose keys, ownership and history are set up by the test.
pub struct NullWallet {
    network: NetworkId,
    keys: Mutex<HashMap<KeyId, PrivateKey>>,
    owned: Mutex<HashSet<Script>>,
    txs: Mutex<Vec<WalletTx>>,
    synced: AtomicBool,
    locked: AtomicBool,
}

impl NullWallet {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            keys: Mutex::new(HashMap::new()),
            owned: Mutex::new(HashSet::new()),
            txs: Mutex::new(Vec::new()),
            synced: AtomicBool::new(true),
            locked: AtomicBool::new(false),
        }
    }

    fn add_key(&self, witness: bool) -> Script {
        let key = generate_private_key();
        let id = key_id(&public_key(&key).expect("generated key is valid"));
        let dest = if witness {
            Destination::WitnessPubKeyHash(id.0)
        } else {
            Destination::PubKeyHash(id.0)
        };
        let script = Script::from_destination(&dest);
        self.keys.lock().unwrap().insert(id, key);
        self.owned.lock().unwrap().insert(script.clone());
        script
    }

    /// Generate a key and return its pay-to-pubkey-hash script.
    pub fn add_p2pkh_key(&self) -> Script {
        self.add_key(false)
    }

    /// Generate a key and return its witness-pubkey-hash script.
    pub fn add_p2wpkh_key(&self) -> Script {
        self.add_key(true)
    }

    /// Mark a script as owned without holding its key.
    pub fn add_watch_only(&self, script: Script) {
        self.owned.lock().unwrap().insert(script);
    }

    pub fn add_transaction(&self, tx: WalletTx) {
        self.txs.lock().unwrap().push(tx);
    }

    /// Record a main-chain staking transaction paying `value` to `script`.
    pub fn add_stake(&self, script: &Script, value: u64, time: u64) {
        let mut txs = self.txs.lock().unwrap();
        let mut txid = [0u8; 32];
        txid[..8].copy_from_slice(&(txs.len() as u64).to_le_bytes());
        txs.push(WalletTx {
            txid: TxId::new(txid),
            time: Timestamp::new(time),
            is_coinstake: true,
            in_main_chain: true,
            stake_reward: Amount::new(value / 10),
            outputs: vec![TxOut {
                value: Amount::new(value),
                script_pubkey: script.clone(),
            }],
        });
    }

    /// The address a script encodes to on this wallet's network.
    pub fn address_of(&self, script: &Script) -> Address {
        script
            .destination()
            .and_then(|d| encode_destination(&d, self.network).ok())
            .expect("script has an address")
    }

    pub fn set_synced(&self, synced: bool) {
        self.synced.store(synced, Ordering::SeqCst);
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }
}

impl StakeWallet for NullWallet {
    fn network(&self) -> NetworkId {
        self.network
    }

    fn is_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    fn transactions(&self) -> Vec<WalletTx> {
        self.txs.lock().unwrap().clone()
    }

    fn is_mine(&self, script: &Script) -> bool {
        self.owned.lock().unwrap().contains(script)
    }

    fn sign_message_hash(
        &self,
        key_id: &KeyId,
        hash: &[u8; 32],
    ) -> Result<CompactSignature, SignError> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(SignError::Locked);
        }
        let keys = self.keys.lock().unwrap();
        let key = keys.get(key_id).ok_or(SignError::KeyNotFound)?;
        sign_compact(hash, key).map_err(|e| SignError::Declined(e.to_string()))
    }
}
