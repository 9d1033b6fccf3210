//! Nullable coordination transport: scripted responses, recorded requests.

use async_trait::async_trait;
use stakegov_governance::ballot::decode_payload;
use stakegov_governance::{CoordinationTransport, TransportError};
use stakegov_types::{Amount, Proposal, VoteRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A coordination service stand-in.
///
/// Proposals are returned as configured. A cast returns one record per
/// submitted ballot whose address has a configured weight; other ballots
/// go uncounted.
#[derive(Default)]
pub struct NullTransport {
    proposals: Mutex<Vec<Proposal>>,
    weights: Mutex<HashMap<String, u64>>,
    payloads: Mutex<Vec<String>>,
    proposal_requests: AtomicUsize,
    cast_requests: AtomicUsize,
    fail: AtomicBool,
    hang: AtomicBool,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_proposals(&self, proposals: Vec<Proposal>) {
        *self.proposals.lock().unwrap() = proposals;
    }

    /// Weight the service reports for ballots from `address`.
    pub fn set_weight(&self, address: &str, weight: u64) {
        self.weights.lock().unwrap().insert(address.to_string(), weight);
    }

    /// Make every request fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make every request wait forever.
    pub fn set_hanging(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    pub fn proposal_requests(&self) -> usize {
        self.proposal_requests.load(Ordering::SeqCst)
    }

    pub fn cast_requests(&self) -> usize {
        self.cast_requests.load(Ordering::SeqCst)
    }

    pub fn total_requests(&self) -> usize {
        self.proposal_requests() + self.cast_requests()
    }

    /// Every CAST_VOTE payload received, in order.
    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }

    async fn gate(&self) -> Result<(), TransportError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::RequestFailed("null transport failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CoordinationTransport for NullTransport {
    async fn get_proposals(&self) -> Result<Vec<Proposal>, TransportError> {
        self.proposal_requests.fetch_add(1, Ordering::SeqCst);
        self.gate().await?;
        Ok(self.proposals.lock().unwrap().clone())
    }

    async fn cast_votes(&self, payload: &str) -> Result<Vec<VoteRecord>, TransportError> {
        self.cast_requests.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.to_string());
        self.gate().await?;
        let ballots =
            decode_payload(payload).map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        let weights = self.weights.lock().unwrap();
        Ok(ballots
            .into_iter()
            .filter_map(|b| {
                weights.get(b.address.as_str()).map(|&w| VoteRecord {
                    vote_id: b.vote_id,
                    address: b.address,
                    weight: Amount::new(w),
                })
            })
            .collect())
    }
}
