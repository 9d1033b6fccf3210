//! The file-backed staking wallet.
//!
//! Public key material, watch-only scripts and the transaction history are
//! stored in clear; signing keys live in a single encrypted keystore blob and
//! are only held in memory while the wallet is unlocked.

use serde::{Deserialize, Serialize};
use stakegov_crypto::{
    encode_destination, generate_private_key, key_id, private_key_from_bytes, public_key,
    sign_compact,
};
use stakegov_governance::{key_id_for_destination, SignError, StakeWallet};
use stakegov_types::{
    Address, CompactSignature, Destination, KeyId, NetworkId, PrivateKey, PublicKey, Script,
    TxId, WalletTx,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::WalletError;
use crate::keystore::{decrypt_keystore, encrypt_keystore, KdfParams, KeystoreFile};
use crate::node::NodeClient;

const WALLET_FILE_VERSION: u32 = 1;

/// Which address form a key is handed out as.
///
/// Ownership checks accept every standard form of a held key regardless.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Legacy,
    #[default]
    Witness,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct KeyRecord {
    /// Hex-encoded SEC1 public key.
    public_key: String,
    kind: KeyKind,
    #[serde(default)]
    label: String,
}

/// Plaintext form of one keystore entry.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct SecretRecord {
    secret: String,
    compressed: bool,
}

#[derive(Serialize, Deserialize)]
struct WalletFile {
    version: u32,
    network: NetworkId,
    keystore: KeystoreFile,
    keys: Vec<KeyRecord>,
    #[serde(default)]
    watch_only: Vec<Script>,
    #[serde(default)]
    transactions: Vec<WalletTx>,
}

pub struct Wallet {
    network: NetworkId,
    keystore: KeystoreFile,
    keys: Vec<KeyRecord>,
    index: HashMap<KeyId, PublicKey>,
    watch_only: Vec<Script>,
    transactions: Vec<WalletTx>,
    unlocked: RwLock<Option<HashMap<KeyId, PrivateKey>>>,
    synced: AtomicBool,
}

impl Wallet {
    /// Create an empty wallet whose keystore is sealed with `password`.
    pub fn create(network: NetworkId, password: &str, kdf: KdfParams) -> Result<Self, WalletError> {
        let plaintext = encode_secrets(&[])?;
        let keystore = encrypt_keystore(&plaintext, password, kdf)?;
        info!(network = network.as_str(), "created new wallet");
        Ok(Self::from_parts(network, keystore, Vec::new(), Vec::new(), Vec::new()))
    }

    /// Load a wallet file. The wallet starts locked and unsynced.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| WalletError::File(format!("failed to read {}: {e}", path.display())))?;
        let file: WalletFile = serde_json::from_str(&json)
            .map_err(|e| WalletError::File(format!("invalid wallet file: {e}")))?;
        if file.version != WALLET_FILE_VERSION {
            return Err(WalletError::File(format!(
                "unsupported wallet file version: {}",
                file.version
            )));
        }
        let wallet = Self::from_parts(
            file.network,
            file.keystore,
            file.keys,
            file.watch_only,
            file.transactions,
        );
        if wallet.index.len() != wallet.keys.len() {
            return Err(WalletError::File("wallet file holds an invalid public key".into()));
        }
        info!(
            path = %path.display(),
            keys = wallet.keys.len(),
            watch_only = wallet.watch_only.len(),
            transactions = wallet.transactions.len(),
            "loaded wallet"
        );
        Ok(wallet)
    }

    /// Load a wallet file and check that it belongs to `network`.
    pub fn open(path: &Path, network: NetworkId) -> Result<Self, WalletError> {
        let wallet = Self::load(path)?;
        if wallet.network != network {
            return Err(WalletError::NetworkMismatch {
                found: wallet.network.as_str().to_string(),
                expected: network.as_str().to_string(),
            });
        }
        Ok(wallet)
    }

    /// Write the wallet file, replacing any previous copy atomically.
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let file = WalletFile {
            version: WALLET_FILE_VERSION,
            network: self.network,
            keystore: self.keystore.clone(),
            keys: self.keys.clone(),
            watch_only: self.watch_only.clone(),
            transactions: self.transactions.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| WalletError::File(format!("JSON serialization failed: {e}")))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| WalletError::File(format!("failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| WalletError::File(format!("failed to replace {}: {e}", path.display())))?;
        debug!(path = %path.display(), "saved wallet");
        Ok(())
    }

    fn from_parts(
        network: NetworkId,
        keystore: KeystoreFile,
        keys: Vec<KeyRecord>,
        watch_only: Vec<Script>,
        transactions: Vec<WalletTx>,
    ) -> Self {
        let index = keys
            .iter()
            .filter_map(|record| {
                let bytes = hex::decode(&record.public_key).ok()?;
                let pk = PublicKey::from_slice(&bytes).ok()?;
                Some((key_id(&pk), pk))
            })
            .collect();
        Self {
            network,
            keystore,
            keys,
            index,
            watch_only,
            transactions,
            unlocked: RwLock::new(None),
            synced: AtomicBool::new(false),
        }
    }

    /// Generate a fresh compressed key and return the address it is handed out as.
    pub fn generate_key(
        &mut self,
        password: &str,
        kind: KeyKind,
        label: &str,
    ) -> Result<Address, WalletError> {
        self.add_key(password, generate_private_key(), kind, label)
    }

    /// Import a raw secp256k1 secret.
    pub fn import_key(
        &mut self,
        password: &str,
        secret: [u8; 32],
        compressed: bool,
        kind: KeyKind,
        label: &str,
    ) -> Result<Address, WalletError> {
        let key = private_key_from_bytes(secret, compressed)?;
        self.add_key(password, key, kind, label)
    }

    fn add_key(
        &mut self,
        password: &str,
        key: PrivateKey,
        kind: KeyKind,
        label: &str,
    ) -> Result<Address, WalletError> {
        let pk = public_key(&key)?;
        let id = key_id(&pk);
        if self.index.contains_key(&id) {
            return Err(WalletError::Key(format!("key {id} is already in the wallet")));
        }

        let mut secrets = decode_secrets(&decrypt_keystore(&self.keystore, password)?)?;
        secrets.push(SecretRecord {
            secret: hex::encode(key.secret_bytes()),
            compressed: key.is_compressed(),
        });
        let plaintext = encode_secrets(&secrets)?;
        self.keystore = encrypt_keystore(&plaintext, password, self.keystore.crypto.kdf_params)?;

        let address = encode_destination(&destination_for(&pk, kind), self.network)?;
        self.keys.push(KeyRecord {
            public_key: hex::encode(pk.as_bytes()),
            kind,
            label: label.to_string(),
        });
        self.index.insert(id, pk);

        let mut unlocked = self.unlocked.write().map_err(|_| poisoned())?;
        if let Some(keys) = unlocked.as_mut() {
            keys.insert(id, key);
        }
        info!(address = %address, key = %id, "added key to wallet");
        Ok(address)
    }

    /// Re-seal the keystore under a new password.
    pub fn change_password(&mut self, old: &str, new: &str) -> Result<(), WalletError> {
        let plaintext = decrypt_keystore(&self.keystore, old)?;
        self.keystore = encrypt_keystore(&plaintext, new, self.keystore.crypto.kdf_params)?;
        Ok(())
    }

    /// Decrypt the signing keys into memory. Returns the number of keys unlocked.
    pub fn unlock(&self, password: &str) -> Result<usize, WalletError> {
        let secrets = decode_secrets(&decrypt_keystore(&self.keystore, password)?)?;
        let mut keys = HashMap::with_capacity(secrets.len());
        for record in &secrets {
            let bytes = Zeroizing::new(
                hex::decode(&record.secret)
                    .map_err(|e| WalletError::Key(format!("invalid secret hex: {e}")))?,
            );
            let secret: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| WalletError::Key("secret has wrong length".into()))?;
            let key = private_key_from_bytes(secret, record.compressed)?;
            keys.insert(key_id(&public_key(&key)?), key);
        }
        let count = keys.len();
        *self.unlocked.write().map_err(|_| poisoned())? = Some(keys);
        info!(keys = count, "wallet unlocked");
        Ok(count)
    }

    /// Drop the decrypted keys.
    pub fn lock(&self) {
        if let Ok(mut unlocked) = self.unlocked.write() {
            *unlocked = None;
        }
    }

    pub fn is_locked(&self) -> bool {
        self.unlocked.read().map(|u| u.is_none()).unwrap_or(true)
    }

    /// Addresses of every held key, in the form each was handed out as.
    pub fn addresses(&self) -> Result<Vec<Address>, WalletError> {
        self.keys
            .iter()
            .filter_map(|record| {
                let bytes = hex::decode(&record.public_key).ok()?;
                let pk = PublicKey::from_slice(&bytes).ok()?;
                Some((pk, record.kind))
            })
            .map(|(pk, kind)| {
                encode_destination(&destination_for(&pk, kind), self.network).map_err(WalletError::from)
            })
            .collect()
    }

    /// Track a script the wallet does not hold a key for.
    pub fn add_watch_only(&mut self, script: Script) {
        if !self.watch_only.contains(&script) {
            self.watch_only.push(script);
        }
    }

    /// Record a transaction, replacing any earlier copy with the same id.
    pub fn record_transaction(&mut self, tx: WalletTx) {
        match self.transactions.iter_mut().find(|t| t.txid == tx.txid) {
            Some(existing) => *existing = tx,
            None => self.transactions.push(tx),
        }
    }

    pub fn remove_transaction(&mut self, txid: &TxId) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| &t.txid != txid);
        self.transactions.len() != before
    }

    pub fn set_synced(&self, synced: bool) {
        self.synced.store(synced, Ordering::SeqCst);
    }

    /// Query the node and update the sync gate.
    ///
    /// An unreachable node leaves the wallet marked unsynced.
    pub async fn refresh_sync(&self, node: &NodeClient) -> Result<bool, WalletError> {
        match node.is_synced().await {
            Ok(synced) => {
                self.set_synced(synced);
                Ok(synced)
            }
            Err(e) => {
                warn!(node = node.node_url(), error = %e, "node sync query failed");
                self.set_synced(false);
                Err(e)
            }
        }
    }
}

impl StakeWallet for Wallet {
    fn network(&self) -> NetworkId {
        self.network
    }

    fn is_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    fn transactions(&self) -> Vec<WalletTx> {
        self.transactions.clone()
    }

    fn is_mine(&self, script: &Script) -> bool {
        if self.watch_only.contains(script) {
            return true;
        }
        script
            .destination()
            .and_then(|dest| key_id_for_destination(&dest))
            .is_some_and(|id| self.index.contains_key(&id))
    }

    fn sign_message_hash(
        &self,
        key_id: &KeyId,
        hash: &[u8; 32],
    ) -> Result<CompactSignature, SignError> {
        let unlocked = self
            .unlocked
            .read()
            .map_err(|_| SignError::Declined("wallet state poisoned".into()))?;
        let keys = unlocked.as_ref().ok_or(SignError::Locked)?;
        let key = keys.get(key_id).ok_or(SignError::KeyNotFound)?;
        sign_compact(hash, key).map_err(|e| SignError::Declined(e.to_string()))
    }
}

fn destination_for(pk: &PublicKey, kind: KeyKind) -> Destination {
    let id = key_id(pk);
    match kind {
        KeyKind::Legacy => Destination::PubKeyHash(id.0),
        KeyKind::Witness => Destination::WitnessPubKeyHash(id.0),
    }
}

fn encode_secrets(secrets: &[SecretRecord]) -> Result<Zeroizing<Vec<u8>>, WalletError> {
    serde_json::to_vec(secrets)
        .map(Zeroizing::new)
        .map_err(|e| WalletError::Key(format!("failed to encode keystore payload: {e}")))
}

fn decode_secrets(plaintext: &[u8]) -> Result<Vec<SecretRecord>, WalletError> {
    serde_json::from_slice(plaintext)
        .map_err(|e| WalletError::Key(format!("corrupted keystore payload: {e}")))
}

fn poisoned() -> WalletError {
    WalletError::Key("wallet key state poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakegov_crypto::{decode_address, recover_compact, verify_compact};
    use stakegov_types::{Amount, Timestamp, TxOut};

    fn new_wallet() -> Wallet {
        Wallet::create(NetworkId::Test, "pw", KdfParams::insecure_fast()).unwrap()
    }

    fn script_of(wallet: &Wallet, address: &Address) -> Script {
        Script::from_destination(&decode_address(address.as_str(), wallet.network).unwrap())
    }

    fn stake_tx(n: u8, script: Script) -> WalletTx {
        WalletTx {
            txid: TxId::new([n; 32]),
            time: Timestamp::new(1_000 + n as u64),
            is_coinstake: true,
            in_main_chain: true,
            stake_reward: Amount::new(10),
            outputs: vec![TxOut {
                value: Amount::new(100),
                script_pubkey: script,
            }],
        }
    }

    #[test]
    fn new_wallet_is_locked_and_unsynced() {
        let wallet = new_wallet();
        assert!(wallet.is_locked());
        assert!(!wallet.is_synced());
        assert!(wallet.addresses().unwrap().is_empty());
    }

    #[test]
    fn generated_keys_are_owned_in_every_form() {
        let mut wallet = new_wallet();
        let address = wallet.generate_key("pw", KeyKind::Legacy, "main").unwrap();
        let script = script_of(&wallet, &address);
        assert!(wallet.is_mine(&script));

        let Some(Destination::PubKeyHash(hash)) = script.destination() else {
            panic!("legacy key should hand out a pubkey-hash address");
        };
        assert!(wallet.is_mine(&Script::from_destination(&Destination::WitnessPubKeyHash(hash))));
        assert!(!wallet.is_mine(&Script::from_destination(&Destination::ScriptHash(hash))));
        assert!(!wallet.is_mine(&Script::from_destination(&Destination::PubKeyHash([0; 20]))));
    }

    #[test]
    fn wrong_password_cannot_add_keys() {
        let mut wallet = new_wallet();
        assert!(matches!(
            wallet.generate_key("nope", KeyKind::Witness, ""),
            Err(WalletError::WrongPassword)
        ));
        assert!(wallet.addresses().unwrap().is_empty());
    }

    #[test]
    fn signing_requires_unlock() {
        let mut wallet = new_wallet();
        let address = wallet.generate_key("pw", KeyKind::Witness, "").unwrap();
        let dest = decode_address(address.as_str(), wallet.network).unwrap();
        let id = wallet.key_id_for(&dest).unwrap();
        let hash = [9u8; 32];

        assert_eq!(wallet.sign_message_hash(&id, &hash), Err(SignError::Locked));

        assert_eq!(wallet.unlock("pw").unwrap(), 1);
        let sig = wallet.sign_message_hash(&id, &hash).unwrap();
        assert!(verify_compact(&hash, &sig, &id));
        assert_eq!(key_id(&recover_compact(&hash, &sig).unwrap()), id);

        wallet.lock();
        assert_eq!(wallet.sign_message_hash(&id, &hash), Err(SignError::Locked));
    }

    #[test]
    fn unlock_with_wrong_password_stays_locked() {
        let mut wallet = new_wallet();
        wallet.generate_key("pw", KeyKind::Witness, "").unwrap();
        assert!(wallet.unlock("bad").is_err());
        assert!(wallet.is_locked());
    }

    #[test]
    fn watch_only_is_owned_but_cannot_sign() {
        let mut wallet = new_wallet();
        let script = Script::from_destination(&Destination::PubKeyHash([4; 20]));
        wallet.add_watch_only(script.clone());
        wallet.unlock("pw").unwrap();

        assert!(wallet.is_mine(&script));
        assert_eq!(
            wallet.sign_message_hash(&KeyId([4; 20]), &[0; 32]),
            Err(SignError::KeyNotFound)
        );
    }

    #[test]
    fn uncompressed_import_is_owned_but_declines_to_sign() {
        let mut wallet = new_wallet();
        let address = wallet
            .import_key("pw", [7u8; 32], false, KeyKind::Legacy, "old")
            .unwrap();
        let dest = decode_address(address.as_str(), wallet.network).unwrap();
        let id = wallet.key_id_for(&dest).unwrap();
        wallet.unlock("pw").unwrap();
        assert!(wallet.is_mine(&Script::from_destination(&dest)));
        assert!(matches!(
            wallet.sign_message_hash(&id, &[1; 32]),
            Err(SignError::Declined(_))
        ));
    }

    #[test]
    fn duplicate_import_rejected() {
        let mut wallet = new_wallet();
        wallet
            .import_key("pw", [3u8; 32], true, KeyKind::Witness, "")
            .unwrap();
        assert!(wallet
            .import_key("pw", [3u8; 32], true, KeyKind::Legacy, "")
            .is_err());
        assert_eq!(wallet.addresses().unwrap().len(), 1);
    }

    #[test]
    fn keys_added_while_unlocked_can_sign_immediately() {
        let mut wallet = new_wallet();
        wallet.unlock("pw").unwrap();
        let address = wallet.generate_key("pw", KeyKind::Witness, "").unwrap();
        let id = wallet
            .key_id_for(&decode_address(address.as_str(), wallet.network).unwrap())
            .unwrap();
        assert!(wallet.sign_message_hash(&id, &[2; 32]).is_ok());
    }

    #[test]
    fn transactions_replace_by_txid() {
        let mut wallet = new_wallet();
        let script = Script::from_destination(&Destination::PubKeyHash([1; 20]));
        wallet.record_transaction(stake_tx(1, script.clone()));
        let mut orphaned = stake_tx(1, script.clone());
        orphaned.in_main_chain = false;
        wallet.record_transaction(orphaned);
        wallet.record_transaction(stake_tx(2, script));

        let txs = wallet.transactions();
        assert_eq!(txs.len(), 2);
        assert!(!txs[0].in_main_chain);
        assert!(wallet.remove_transaction(&TxId::new([2; 32])));
        assert!(!wallet.remove_transaction(&TxId::new([2; 32])));
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");

        let mut wallet = new_wallet();
        let address = wallet.generate_key("pw", KeyKind::Witness, "savings").unwrap();
        let script = script_of(&wallet, &address);
        wallet.record_transaction(stake_tx(5, script.clone()));
        wallet.save(&path).unwrap();

        let loaded = Wallet::open(&path, NetworkId::Test).unwrap();
        assert!(loaded.is_locked());
        assert_eq!(loaded.addresses().unwrap(), vec![address]);
        assert!(loaded.is_mine(&script));
        assert_eq!(loaded.transactions().len(), 1);
        assert_eq!(loaded.unlock("pw").unwrap(), 1);

        assert!(matches!(
            Wallet::open(&path, NetworkId::Main),
            Err(WalletError::NetworkMismatch { .. })
        ));
    }

    #[test]
    fn change_password_reseals_keys() {
        let mut wallet = new_wallet();
        wallet.generate_key("pw", KeyKind::Witness, "").unwrap();
        wallet.change_password("pw", "new").unwrap();
        assert!(wallet.unlock("pw").is_err());
        assert_eq!(wallet.unlock("new").unwrap(), 1);
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Wallet::load(&path), Err(WalletError::File(_))));
        assert!(Wallet::load(&dir.path().join("missing.json")).is_err());
    }
}
