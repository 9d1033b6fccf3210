//! Output scripts and the destinations they pay to.
//!
//! Only the standard templates a staking wallet produces are recognised.
//! Anything else classifies as [`ScriptKind::NonStandard`] and has no
//! destination.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::keys::{PublicKey, COMPRESSED_PUBLIC_KEY_LEN, UNCOMPRESSED_PUBLIC_KEY_LEN};
use crate::TypesError;

const OP_0: u8 = 0x00;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

/// Template a script matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    PayToPubKey,
    PayToPubKeyHash,
    PayToScriptHash,
    PayToWitnessPubKeyHash,
    PayToWitnessScriptHash,
    NonStandard,
}

impl ScriptKind {
    /// P2SH and P2WSH: outputs whose spending conditions are an opaque script.
    pub fn is_script_hash_family(&self) -> bool {
        matches!(self, Self::PayToScriptHash | Self::PayToWitnessScriptHash)
    }
}

/// Where an output pays to, independent of address encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Destination {
    /// A bare public key; encodes as the pubkey-hash address of that key.
    PubKey(PublicKey),
    PubKeyHash([u8; 20]),
    ScriptHash([u8; 20]),
    WitnessPubKeyHash([u8; 20]),
    WitnessScriptHash([u8; 32]),
}

/// A raw output script.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| TypesError::InvalidHex(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn kind(&self) -> ScriptKind {
        let s = self.0.as_slice();
        match s.len() {
            25 if s[0] == OP_DUP
                && s[1] == OP_HASH160
                && s[2] == 20
                && s[23] == OP_EQUALVERIFY
                && s[24] == OP_CHECKSIG =>
            {
                ScriptKind::PayToPubKeyHash
            }
            23 if s[0] == OP_HASH160 && s[1] == 20 && s[22] == OP_EQUAL => {
                ScriptKind::PayToScriptHash
            }
            22 if s[0] == OP_0 && s[1] == 20 => ScriptKind::PayToWitnessPubKeyHash,
            34 if s[0] == OP_0 && s[1] == 32 => ScriptKind::PayToWitnessScriptHash,
            35 if s[0] == COMPRESSED_PUBLIC_KEY_LEN as u8
                && matches!(s[1], 0x02 | 0x03)
                && s[34] == OP_CHECKSIG =>
            {
                ScriptKind::PayToPubKey
            }
            67 if s[0] == UNCOMPRESSED_PUBLIC_KEY_LEN as u8
                && s[1] == 0x04
                && s[66] == OP_CHECKSIG =>
            {
                ScriptKind::PayToPubKey
            }
            _ => ScriptKind::NonStandard,
        }
    }

    /// The destination this script pays to, if it matches a standard template.
    pub fn destination(&self) -> Option<Destination> {
        let s = self.0.as_slice();
        match self.kind() {
            ScriptKind::PayToPubKey => {
                PublicKey::from_slice(&s[1..s.len() - 1]).ok().map(Destination::PubKey)
            }
            ScriptKind::PayToPubKeyHash => Some(Destination::PubKeyHash(copy20(&s[3..23]))),
            ScriptKind::PayToScriptHash => Some(Destination::ScriptHash(copy20(&s[2..22]))),
            ScriptKind::PayToWitnessPubKeyHash => {
                Some(Destination::WitnessPubKeyHash(copy20(&s[2..22])))
            }
            ScriptKind::PayToWitnessScriptHash => {
                let mut h = [0u8; 32];
                h.copy_from_slice(&s[2..34]);
                Some(Destination::WitnessScriptHash(h))
            }
            ScriptKind::NonStandard => None,
        }
    }

    /// Build the canonical output script for a destination.
    pub fn from_destination(dest: &Destination) -> Self {
        let mut s = Vec::with_capacity(35);
        match dest {
            Destination::PubKey(pk) => {
                s.push(pk.as_bytes().len() as u8);
                s.extend_from_slice(pk.as_bytes());
                s.push(OP_CHECKSIG);
            }
            Destination::PubKeyHash(h) => {
                s.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
                s.extend_from_slice(h);
                s.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
            }
            Destination::ScriptHash(h) => {
                s.extend_from_slice(&[OP_HASH160, 20]);
                s.extend_from_slice(h);
                s.push(OP_EQUAL);
            }
            Destination::WitnessPubKeyHash(h) => {
                s.extend_from_slice(&[OP_0, 20]);
                s.extend_from_slice(h);
            }
            Destination::WitnessScriptHash(h) => {
                s.extend_from_slice(&[OP_0, 32]);
                s.extend_from_slice(h);
            }
        }
        Self(s)
    }
}

fn copy20(bytes: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(bytes);
    out
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_standard_templates() {
        let h20 = [7u8; 20];
        let cases = [
            (Destination::PubKeyHash(h20), ScriptKind::PayToPubKeyHash),
            (Destination::ScriptHash(h20), ScriptKind::PayToScriptHash),
            (Destination::WitnessPubKeyHash(h20), ScriptKind::PayToWitnessPubKeyHash),
            (
                Destination::WitnessScriptHash([9u8; 32]),
                ScriptKind::PayToWitnessScriptHash,
            ),
        ];
        for (dest, kind) in cases {
            let script = Script::from_destination(&dest);
            assert_eq!(script.kind(), kind);
            assert_eq!(script.destination(), Some(dest));
        }
    }

    #[test]
    fn pay_to_pubkey_round_trips() {
        let mut key = [0x11u8; 33];
        key[0] = 0x02;
        let dest = Destination::PubKey(PublicKey::from_slice(&key).unwrap());
        let script = Script::from_destination(&dest);
        assert_eq!(script.kind(), ScriptKind::PayToPubKey);
        assert_eq!(script.destination(), Some(dest));
    }

    #[test]
    fn script_hash_family() {
        assert!(ScriptKind::PayToScriptHash.is_script_hash_family());
        assert!(ScriptKind::PayToWitnessScriptHash.is_script_hash_family());
        assert!(!ScriptKind::PayToWitnessPubKeyHash.is_script_hash_family());
        assert!(!ScriptKind::PayToPubKeyHash.is_script_hash_family());
    }

    #[test]
    fn garbage_is_non_standard() {
        let script = Script::new(vec![0x6a, 0x04, 1, 2, 3, 4]);
        assert_eq!(script.kind(), ScriptKind::NonStandard);
        assert_eq!(script.destination(), None);
        assert_eq!(Script::default().kind(), ScriptKind::NonStandard);
    }

    #[test]
    fn hex_serde() {
        let script = Script::from_destination(&Destination::WitnessPubKeyHash([1u8; 20]));
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, format!("\"0014{}\"", "01".repeat(20)));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
