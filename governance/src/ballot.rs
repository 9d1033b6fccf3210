//! Ballot construction, signing, and the JSON wire payload.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stakegov_crypto::{decode_address, encode_destination, signed_message_hash, verify_compact};
use stakegov_types::{Address, Ballot, CompactSignature, Decision, NetworkId, Script, VoteId};

use crate::wallet::key_id_for_destination;
use crate::{GovernanceError, SignError, StakeWallet};

/// The exact text a ballot signs: `<vote_id>_<token>`.
pub fn ballot_message(vote_id: &VoteId, decision: Decision) -> String {
    format!("{}_{}", vote_id, decision.token())
}

/// Signs one ballot per eligible script with the wallet's keys.
pub struct BallotSigner<'a> {
    wallet: &'a dyn StakeWallet,
}

impl<'a> BallotSigner<'a> {
    pub fn new(wallet: &'a dyn StakeWallet) -> Self {
        Self { wallet }
    }

    pub fn sign(
        &self,
        script: &Script,
        vote_id: &VoteId,
        decision: Decision,
    ) -> Result<Ballot, GovernanceError> {
        let network = self.wallet.network();
        let dest = script
            .destination()
            .ok_or_else(|| GovernanceError::AddressResolution(script.to_hex()))?;
        let address = encode_destination(&dest, network)
            .map_err(|_| GovernanceError::AddressResolution(script.to_hex()))?;
        let key_id = self
            .wallet
            .key_id_for(&dest)
            .ok_or_else(|| GovernanceError::KeyUnavailable(address.to_string()))?;

        let hash = signed_message_hash(network.message_magic(), &ballot_message(vote_id, decision));
        let signature = self
            .wallet
            .sign_message_hash(&key_id, &hash)
            .map_err(|e| match e {
                SignError::KeyNotFound => GovernanceError::KeyUnavailable(address.to_string()),
                other => GovernanceError::Signing {
                    address: address.to_string(),
                    reason: other.to_string(),
                },
            })?;

        debug!(%address, %vote_id, "signed ballot");
        Ok(Ballot {
            vote_id: vote_id.clone(),
            address,
            signature,
            decision,
        })
    }

    /// Sign every script, stopping at the first failure.
    pub fn sign_all(
        &self,
        scripts: &[Script],
        vote_id: &VoteId,
        decision: Decision,
    ) -> Result<Vec<Ballot>, GovernanceError> {
        scripts
            .iter()
            .map(|script| self.sign(script, vote_id, decision))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| warn!(%vote_id, error = %e, "ballot signing aborted"))
    }
}

/// Check a ballot's signature against the key behind its address.
pub fn verify_ballot(ballot: &Ballot, network: NetworkId) -> bool {
    let Ok(dest) = decode_address(ballot.address.as_str(), network) else {
        return false;
    };
    let Some(key_id) = key_id_for_destination(&dest) else {
        return false;
    };
    let hash = signed_message_hash(
        network.message_magic(),
        &ballot_message(&ballot.vote_id, ballot.decision),
    );
    verify_compact(&hash, &ballot.signature, &key_id)
}

/// One ballot as the coordination service expects it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBallot {
    pub voteid: String,
    pub address: String,
    /// Base64 of the 65-byte compact signature.
    pub signature: String,
    /// `"0"` or `"1"`.
    pub ballot: String,
}

impl From<&Ballot> for WireBallot {
    fn from(b: &Ballot) -> Self {
        Self {
            voteid: b.vote_id.to_string(),
            address: b.address.to_string(),
            signature: BASE64.encode(b.signature.as_bytes()),
            ballot: b.decision.token().to_string(),
        }
    }
}

impl TryFrom<WireBallot> for Ballot {
    type Error = GovernanceError;

    fn try_from(w: WireBallot) -> Result<Self, Self::Error> {
        let invalid = |what: &str| GovernanceError::Serialization(format!("invalid ballot {what}"));
        let bytes = BASE64.decode(&w.signature).map_err(|_| invalid("signature"))?;
        Ok(Ballot {
            vote_id: VoteId::new(w.voteid).map_err(|_| invalid("vote id"))?,
            address: Address::new(w.address),
            signature: CompactSignature::from_slice(&bytes).map_err(|_| invalid("signature"))?,
            decision: match w.ballot.as_str() {
                "0" => Decision::Against,
                "1" => Decision::For,
                _ => return Err(invalid("decision")),
            },
        })
    }
}

/// Serialize ballots as the CAST_VOTE JSON array.
pub fn encode_payload(ballots: &[Ballot]) -> Result<String, GovernanceError> {
    let wire: Vec<WireBallot> = ballots.iter().map(WireBallot::from).collect();
    Ok(serde_json::to_string(&wire)?)
}

pub fn decode_payload(payload: &str) -> Result<Vec<Ballot>, GovernanceError> {
    let wire: Vec<WireBallot> = serde_json::from_str(payload)?;
    wire.into_iter().map(Ballot::try_from).collect()
}
