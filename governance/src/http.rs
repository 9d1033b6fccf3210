//! HTTP transport for the coordination service.
//!
//! `GET {base}/proposals` returns a JSON array of proposals;
//! `POST {base}/votes` takes the ballot array and returns the vote records
//! counted for it. Numeric fields may arrive as JSON numbers or strings.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

use stakegov_types::{Address, Amount, Proposal, Timestamp, VoteId, VoteRecord};

use crate::{CoordinationTransport, TransportError};

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpTransport {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(serde_json::Number),
    Text(String),
}

impl Lenient {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let s = Lenient::deserialize(d)?.into_string();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse().map_err(serde::de::Error::custom)
}

fn lenient_coins<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
    let s = Lenient::deserialize(d)?.into_string();
    if s.is_empty() {
        return Ok(Amount::ZERO);
    }
    Amount::from_coin_str(&s).map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
struct ProposalResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "voteid")]
    vote_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    details: String,
    #[serde(default)]
    address: String,
    /// Requested amount in whole coins, decimals allowed.
    #[serde(default, deserialize_with = "lenient_coins")]
    amount: Amount,
    #[serde(default)]
    txid: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    start_time: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    end_time: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    votes_affirm: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    votes_oppose: u64,
}

impl TryFrom<ProposalResponse> for Proposal {
    type Error = TransportError;

    fn try_from(r: ProposalResponse) -> Result<Self, Self::Error> {
        let vote_id = VoteId::new(r.vote_id)
            .map_err(|e| TransportError::InvalidResponse(format!("proposal: {e}")))?;
        Ok(Proposal {
            id: r.id.unwrap_or_else(|| vote_id.to_string()),
            vote_id,
            name: r.name,
            address: Address::new(r.address),
            amount: r.amount,
            details: r.details,
            txid: r.txid,
            start_time: Timestamp::new(r.start_time),
            end_time: Timestamp::new(r.end_time),
            votes_affirm: r.votes_affirm,
            votes_oppose: r.votes_oppose,
        })
    }
}

/// Echoed signature/ballot fields are ignored.
#[derive(Debug, Deserialize)]
struct VoteRecordResponse {
    #[serde(alias = "voteid")]
    vote_id: String,
    address: String,
    /// Raw units.
    #[serde(deserialize_with = "lenient_u64")]
    weight: u64,
}

impl TryFrom<VoteRecordResponse> for VoteRecord {
    type Error = TransportError;

    fn try_from(r: VoteRecordResponse) -> Result<Self, Self::Error> {
        Ok(VoteRecord {
            vote_id: VoteId::new(r.vote_id)
                .map_err(|e| TransportError::InvalidResponse(format!("vote record: {e}")))?,
            address: Address::new(r.address),
            weight: Amount::new(r.weight),
        })
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    // Connect timeouts also report `is_timeout`; nothing was sent for those.
    if e.is_connect() {
        TransportError::Unreachable(format!("connection failed: {e}"))
    } else if e.is_timeout() {
        TransportError::TimedOut(e.to_string())
    } else {
        TransportError::RequestFailed(e.to_string())
    }
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_array<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, TransportError> {
        if !response.status().is_success() {
            return Err(TransportError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::TimedOut(e.to_string())
            } else {
                TransportError::InvalidResponse(e.to_string())
            }
        })
    }
}

#[async_trait]
impl CoordinationTransport for HttpTransport {
    async fn get_proposals(&self) -> Result<Vec<Proposal>, TransportError> {
        let url = format!("{}/proposals", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(map_send_error)?;
        let raw: Vec<ProposalResponse> = Self::read_array(response).await?;
        raw.into_iter().map(Proposal::try_from).collect()
    }

    async fn cast_votes(&self, payload: &str) -> Result<Vec<VoteRecord>, TransportError> {
        let url = format!("{}/votes", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(map_send_error)?;
        let raw: Vec<VoteRecordResponse> = Self::read_array(response).await?;
        raw.into_iter().map(VoteRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_fields_accept_strings_and_numbers() {
        let json = r#"[{
            "vote_id": "prop-7", "name": "Exchange listing", "details": "",
            "address": "addr", "amount": "1250.5", "txid": "",
            "start_time": "1700000000", "end_time": 1701000000,
            "votes_affirm": "12", "votes_oppose": 3
        }]"#;
        let raw: Vec<ProposalResponse> = serde_json::from_str(json).unwrap();
        let p = Proposal::try_from(raw.into_iter().next().unwrap()).unwrap();
        assert_eq!(p.id, "prop-7");
        assert_eq!(p.amount, Amount::from_coin_str("1250.5").unwrap());
        assert_eq!(p.start_time, Timestamp::new(1_700_000_000));
        assert_eq!(p.end_time, Timestamp::new(1_701_000_000));
        assert_eq!((p.votes_affirm, p.votes_oppose), (12, 3));
    }

    #[test]
    fn vote_record_ignores_echo_fields() {
        let json = r#"[{"voteid":"p1","address":"a","signature":"c2ln","vote":"1","weight":"10"}]"#;
        let raw: Vec<VoteRecordResponse> = serde_json::from_str(json).unwrap();
        let r = VoteRecord::try_from(raw.into_iter().next().unwrap()).unwrap();
        assert_eq!(r.weight, Amount::new(10));
        assert_eq!(r.vote_id.as_str(), "p1");
    }

    #[test]
    fn negative_weight_rejected() {
        let json = r#"[{"vote_id":"p1","address":"a","weight":"-5"}]"#;
        assert!(serde_json::from_str::<Vec<VoteRecordResponse>>(json).is_err());
    }

    #[test]
    fn empty_vote_id_rejected() {
        let json = r#"[{"vote_id":"","address":"a","weight":1}]"#;
        let raw: Vec<VoteRecordResponse> = serde_json::from_str(json).unwrap();
        assert!(VoteRecord::try_from(raw.into_iter().next().unwrap()).is_err());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let t = HttpTransport::new("http://127.0.0.1:1/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(t.base_url(), "http://127.0.0.1:1/api");
    }
}
