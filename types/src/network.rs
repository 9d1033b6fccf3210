//! Network identifier and the address/message parameters tied to it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::TypesError;

/// Identifies which chain the wallet operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Main,
    /// The public test network.
    Test,
    /// Local regression-test network.
    Regtest,
}

impl NetworkId {
    /// Base58check version byte for pay-to-pubkey-hash addresses.
    pub fn pubkey_address_version(&self) -> u8 {
        match self {
            Self::Main => 38,
            Self::Test | Self::Regtest => 111,
        }
    }

    /// Base58check version byte for pay-to-script-hash addresses.
    pub fn script_address_version(&self) -> u8 {
        match self {
            Self::Main => 53,
            Self::Test | Self::Regtest => 196,
        }
    }

    /// Human-readable part of bech32 witness addresses.
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Self::Main => "sg",
            Self::Test => "tsg",
            Self::Regtest => "sgrt",
        }
    }

    /// Domain tag prepended to every signed message before hashing.
    ///
    /// The coordination service re-derives the signed hash with the same tag.
    pub fn message_magic(&self) -> &'static str {
        "Stake Governance Signed Message:\n"
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Test => "test",
            Self::Regtest => "regtest",
        }
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "main" | "mainnet" | "live" => Ok(Self::Main),
            "test" | "testnet" => Ok(Self::Test),
            "regtest" | "dev" => Ok(Self::Regtest),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_aliases() {
        assert_eq!("mainnet".parse::<NetworkId>().unwrap(), NetworkId::Main);
        assert_eq!("TEST".parse::<NetworkId>().unwrap(), NetworkId::Test);
        assert_eq!("dev".parse::<NetworkId>().unwrap(), NetworkId::Regtest);
        assert!("moon".parse::<NetworkId>().is_err());
    }

    #[test]
    fn versions_differ_per_kind() {
        for net in [NetworkId::Main, NetworkId::Test, NetworkId::Regtest] {
            assert_ne!(net.pubkey_address_version(), net.script_address_version());
        }
    }
}
