//! End-to-end voting operations exposed to the CLI and other front ends.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use stakegov_types::{
    Address, Amount, Clock, Decision, GovernanceEntry, Proposal, Timestamp, VoteId,
};

use crate::aggregate::tally;
use crate::ballot::BallotSigner;
use crate::eligibility::{collect, estimate_weight};
use crate::{GovernanceClient, GovernanceConfig, GovernanceError, GovernanceLedger, StakeWallet};

/// What a successful cast produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CastReceipt {
    pub vote_id: VoteId,
    pub decision: Decision,
    /// Weight the service counted, as recorded in the ledger.
    pub weight: Amount,
    pub ballots_submitted: usize,
    pub counted: Vec<Address>,
    /// Submitted addresses the service did not count.
    pub uncounted: Vec<Address>,
    pub recorded_at: Timestamp,
}

pub struct VotingService {
    wallet: Arc<dyn StakeWallet>,
    client: GovernanceClient,
    ledger: GovernanceLedger,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
    eligibility_window_secs: u64,
    /// Serializes casts wallet-wide, from the ledger check to the ledger write.
    cast_lock: Mutex<()>,
}

impl VotingService {
    pub fn new(
        wallet: Arc<dyn StakeWallet>,
        client: GovernanceClient,
        ledger: GovernanceLedger,
        clock: Arc<dyn Clock>,
        config: &GovernanceConfig,
    ) -> Self {
        Self {
            wallet,
            client,
            ledger,
            clock,
            request_timeout: config.request_timeout(),
            eligibility_window_secs: config.eligibility_window_secs(),
            cast_lock: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &GovernanceClient {
        &self.client
    }

    pub async fn list_proposals(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Proposal>, GovernanceError> {
        self.client.fetch_proposals(self.request_timeout, cancel).await
    }

    /// Vote on `proposal` with every eligible address.
    ///
    /// Nothing is sent if this wallet already has a ledger entry for the
    /// proposal. A cast that the service counts no weight for leaves the
    /// ledger untouched. `cancel` stops the cast up to the point the ballots
    /// are sent, never after.
    #[instrument(skip_all, fields(vote_id = %proposal.vote_id, decision = %decision))]
    pub async fn cast_vote(
        &self,
        proposal: &Proposal,
        decision: Decision,
        cancel: &CancellationToken,
    ) -> Result<CastReceipt, GovernanceError> {
        if !self.wallet.is_synced() {
            return Err(GovernanceError::NotSynced);
        }
        let _cast = tokio::select! {
            guard = self.cast_lock.lock() => guard,
            _ = cancel.cancelled() => return Err(GovernanceError::Cancelled),
        };
        let vote_id = &proposal.vote_id;

        if let Some(entry) = self.ledger.get(vote_id)? {
            return Err(GovernanceError::AlreadyVoted {
                vote_id: entry.vote_id,
                weight: entry.weight,
            });
        }

        let scripts = collect(
            self.wallet.as_ref(),
            self.eligibility_window_secs,
            self.clock.now(),
        );
        if scripts.is_empty() {
            return Err(GovernanceError::NoEligibleAddresses);
        }

        let ballots =
            BallotSigner::new(self.wallet.as_ref()).sign_all(&scripts, vote_id, decision)?;
        let addresses: Vec<Address> = ballots.iter().map(|b| b.address.clone()).collect();
        info!(ballots = ballots.len(), "submitting ballots");

        let records = self
            .client
            .submit_ballots(&ballots, self.request_timeout, cancel)
            .await?;
        let result = tally(vote_id, &addresses, &records);
        if !result.uncounted.is_empty() {
            warn!(uncounted = result.uncounted.len(), "service did not count every ballot");
        }
        if result.weight.is_zero() {
            return Err(GovernanceError::ZeroWeightCounted(vote_id.clone()));
        }

        let entry = GovernanceEntry {
            vote_id: vote_id.clone(),
            weight: result.weight,
            recorded_at: self.clock.now(),
        };
        self.ledger.write(&entry)?;

        Ok(CastReceipt {
            vote_id: entry.vote_id,
            decision,
            weight: entry.weight,
            ballots_submitted: ballots.len(),
            counted: result.counted,
            uncounted: result.uncounted,
            recorded_at: entry.recorded_at,
        })
    }

    pub fn has_voted(&self, vote_id: &VoteId) -> Result<bool, GovernanceError> {
        self.ledger.exists(vote_id)
    }

    pub fn recorded_vote(&self, vote_id: &VoteId) -> Result<Option<GovernanceEntry>, GovernanceError> {
        self.ledger.get(vote_id)
    }

    pub fn local_votes(&self) -> Result<Vec<GovernanceEntry>, GovernanceError> {
        self.ledger.list()
    }

    pub async fn erase_all_local_votes(&self) -> Result<u64, GovernanceError> {
        let _cast = self.cast_lock.lock().await;
        self.ledger.erase_all()
    }

    /// Stake weight earned between `start` and `end`, inclusive.
    pub fn estimate_vote_weight(&self, start: Timestamp, end: Timestamp) -> Amount {
        estimate_weight(self.wallet.as_ref(), start, end)
    }
}
