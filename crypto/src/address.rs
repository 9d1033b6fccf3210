//! Address encoding for output destinations.
//!
//! Legacy destinations (pubkey-hash, script-hash) use base58check:
//! `base58(version || payload || sha256d(version || payload)[..4])`.
//! Witness v0 destinations use bech32 with the network's human-readable part.

use bech32::{u5, FromBase32, ToBase32, Variant};
use stakegov_types::{Address, Destination, NetworkId};

use crate::{hash160, sha256d, CryptoError};

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Reverse lookup table: ASCII byte → base58 digit (0xFF = invalid).
const BASE58_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < 58 {
        table[BASE58_ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

const CHECKSUM_LEN: usize = 4;

fn encode_base58(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();
    // Little-endian base58 digits of the big-endian input.
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);
    for &byte in &bytes[zeros..] {
        let mut carry = byte as u32;
        for d in digits.iter_mut() {
            carry += (*d as u32) << 8;
            *d = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }
    let mut out = String::with_capacity(zeros + digits.len());
    out.extend(std::iter::repeat('1').take(zeros));
    out.extend(digits.iter().rev().map(|&d| BASE58_ALPHABET[d as usize] as char));
    out
}

fn decode_base58(s: &str) -> Option<Vec<u8>> {
    let zeros = s.bytes().take_while(|&b| b == b'1').count();
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.bytes().skip(zeros) {
        let digit = *BASE58_DECODE.get(c as usize)?;
        if digit == 0xFF {
            return None;
        }
        let mut carry = digit as u32;
        for b in bytes.iter_mut() {
            carry += (*b as u32) * 58;
            *b = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Some(out)
}

fn encode_base58check(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);
    let checksum = sha256d(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);
    encode_base58(&data)
}

fn decode_base58check(s: &str) -> Result<(u8, Vec<u8>), CryptoError> {
    let data = decode_base58(s).ok_or_else(|| CryptoError::InvalidAddress(s.to_string()))?;
    if data.len() < 1 + CHECKSUM_LEN {
        return Err(CryptoError::InvalidAddress(s.to_string()));
    }
    let (body, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    if sha256d(body)[..CHECKSUM_LEN] != *checksum {
        return Err(CryptoError::Checksum);
    }
    Ok((body[0], body[1..].to_vec()))
}

fn encode_witness_v0(hrp: &str, program: &[u8]) -> Result<String, CryptoError> {
    let version = u5::try_from_u8(0).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
    let mut data = vec![version];
    data.extend(program.to_base32());
    bech32::encode(hrp, data, Variant::Bech32).map_err(|e| CryptoError::InvalidAddress(e.to_string()))
}

/// Render a destination as an address on `network`.
pub fn encode_destination(dest: &Destination, network: NetworkId) -> Result<Address, CryptoError> {
    let encoded = match dest {
        Destination::PubKey(pk) => {
            encode_base58check(network.pubkey_address_version(), &hash160(pk.as_bytes()))
        }
        Destination::PubKeyHash(h) => encode_base58check(network.pubkey_address_version(), h),
        Destination::ScriptHash(h) => encode_base58check(network.script_address_version(), h),
        Destination::WitnessPubKeyHash(h) => encode_witness_v0(network.bech32_hrp(), h)?,
        Destination::WitnessScriptHash(h) => encode_witness_v0(network.bech32_hrp(), h)?,
    };
    Ok(Address::new(encoded))
}

/// Parse an address for `network` back into its destination.
///
/// Bare-pubkey destinations cannot be recovered from an address; they decode
/// as the equivalent pubkey-hash.
pub fn decode_address(address: &str, network: NetworkId) -> Result<Destination, CryptoError> {
    let hrp_prefix = format!("{}1", network.bech32_hrp());
    if address.to_ascii_lowercase().starts_with(&hrp_prefix) {
        return decode_witness(address, network);
    }

    let (version, payload) = decode_base58check(address)?;
    let hash: [u8; 20] = payload
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidAddress(address.to_string()))?;
    if version == network.pubkey_address_version() {
        Ok(Destination::PubKeyHash(hash))
    } else if version == network.script_address_version() {
        Ok(Destination::ScriptHash(hash))
    } else {
        Err(CryptoError::WrongNetwork(address.to_string()))
    }
}

fn decode_witness(address: &str, network: NetworkId) -> Result<Destination, CryptoError> {
    let invalid = || CryptoError::InvalidAddress(address.to_string());
    let (hrp, data, variant) = bech32::decode(address).map_err(|_| invalid())?;
    if hrp != network.bech32_hrp() {
        return Err(CryptoError::WrongNetwork(address.to_string()));
    }
    if variant != Variant::Bech32 || data.is_empty() || data[0].to_u8() != 0 {
        return Err(invalid());
    }
    let program = Vec::<u8>::from_base32(&data[1..]).map_err(|_| invalid())?;
    match program.len() {
        20 => {
            let mut h = [0u8; 20];
            h.copy_from_slice(&program);
            Ok(Destination::WitnessPubKeyHash(h))
        }
        32 => {
            let mut h = [0u8; 32];
            h.copy_from_slice(&program);
            Ok(Destination::WitnessScriptHash(h))
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base58_known_vectors() {
        assert_eq!(encode_base58(b""), "");
        assert_eq!(encode_base58(&[0, 0, 1]), "112");
        assert_eq!(encode_base58(b"hello world"), "StV1DL6CwTryKyV");
        assert_eq!(decode_base58("StV1DL6CwTryKyV").unwrap(), b"hello world");
        assert!(decode_base58("0OIl").is_none());
    }

    #[test]
    fn bitcoin_p2pkh_vector() {
        // Version 0 with hash160 of the generator point is the well-known 1BgGZ9... address.
        let hash = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        assert_eq!(
            encode_base58check(0, &hash),
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"
        );
    }

    #[test]
    fn legacy_round_trip_per_network() {
        for network in [NetworkId::Main, NetworkId::Test] {
            for dest in [Destination::PubKeyHash([3u8; 20]), Destination::ScriptHash([4u8; 20])] {
                let addr = encode_destination(&dest, network).unwrap();
                assert_eq!(decode_address(addr.as_str(), network).unwrap(), dest);
            }
        }
    }

    #[test]
    fn witness_round_trip() {
        let dest = Destination::WitnessPubKeyHash([0xabu8; 20]);
        let addr = encode_destination(&dest, NetworkId::Main).unwrap();
        assert!(addr.as_str().starts_with("sg1"));
        assert_eq!(decode_address(addr.as_str(), NetworkId::Main).unwrap(), dest);

        let dest = Destination::WitnessScriptHash([0xcdu8; 32]);
        let addr = encode_destination(&dest, NetworkId::Test).unwrap();
        assert_eq!(decode_address(addr.as_str(), NetworkId::Test).unwrap(), dest);
    }

    #[test]
    fn wrong_network_rejected() {
        let addr = encode_destination(&Destination::PubKeyHash([1u8; 20]), NetworkId::Main).unwrap();
        assert!(matches!(
            decode_address(addr.as_str(), NetworkId::Test),
            Err(CryptoError::WrongNetwork(_))
        ));
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let addr = encode_destination(&Destination::PubKeyHash([1u8; 20]), NetworkId::Main).unwrap();
        let mut chars: Vec<char> = addr.as_str().chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '2' { '3' } else { '2' };
        let corrupted: String = chars.into_iter().collect();
        assert!(decode_address(&corrupted, NetworkId::Main).is_err());
    }

    proptest! {
        #[test]
        fn base58_decode_inverts_encode(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(decode_base58(&encode_base58(&bytes)).unwrap(), bytes);
        }
    }
}
