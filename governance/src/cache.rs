//! Cooldown-gated proposal list refresh.
//!
//! Two deadlines gate a fetch: the periodic refresh interval, and a short
//! cooldown restarted by every filter change so typing does not trigger a
//! request per keystroke. A fetch happens once the later of the active
//! deadlines has passed.

use std::time::Duration;

use stakegov_types::{Proposal, Timestamp};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{GovernanceClient, GovernanceError};

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_FILTER_COOLDOWN_SECS: u64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// A refresh may run now.
    Idle,
    Waiting { remaining: Duration },
}

#[derive(Debug)]
pub enum Tick {
    NotDue { remaining: Duration },
    Refreshed { count: usize },
    /// The fetch failed; the previous list is kept.
    Failed(GovernanceError),
}

pub struct ProposalCache {
    refresh_interval_secs: u64,
    filter_cooldown_secs: u64,
    refresh_deadline: Option<Timestamp>,
    filter_deadline: Option<Timestamp>,
    filter: String,
    proposals: Vec<Proposal>,
}

impl ProposalCache {
    pub fn new(refresh_interval_secs: u64, filter_cooldown_secs: u64) -> Self {
        Self {
            refresh_interval_secs,
            filter_cooldown_secs,
            refresh_deadline: None,
            filter_deadline: None,
            filter: String::new(),
            proposals: Vec::new(),
        }
    }

    fn deadline(&self) -> Option<Timestamp> {
        self.refresh_deadline.max(self.filter_deadline)
    }

    pub fn state(&self, now: Timestamp) -> CacheState {
        match self.deadline() {
            Some(deadline) if deadline > now => CacheState::Waiting {
                remaining: Duration::from_secs(deadline.as_secs() - now.as_secs()),
            },
            _ => CacheState::Idle,
        }
    }

    pub fn on_filter_changed(&mut self, text: &str, now: Timestamp) {
        self.filter = text.to_string();
        self.filter_deadline = Some(now.saturating_add_secs(self.filter_cooldown_secs));
    }

    /// Clear both deadlines so the next tick fetches.
    pub fn force_refresh(&mut self) {
        self.refresh_deadline = None;
        self.filter_deadline = None;
    }

    pub fn countdown_label(&self, now: Timestamp) -> String {
        match self.state(now) {
            CacheState::Idle => "Refresh".to_string(),
            CacheState::Waiting { remaining } => format!("Please wait... {}", remaining.as_secs()),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Cached proposals matching the current filter text.
    pub fn matching(&self) -> Vec<&Proposal> {
        self.proposals
            .iter()
            .filter(|p| matches_filter(p, &self.filter))
            .collect()
    }

    /// Fetch a fresh list if the deadline has passed.
    ///
    /// The deadline is rearmed before the request goes out, so a failed
    /// fetch is not retried until the next interval.
    pub async fn refresh_if_due(
        &mut self,
        client: &GovernanceClient,
        now: Timestamp,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Tick {
        if let CacheState::Waiting { remaining } = self.state(now) {
            return Tick::NotDue { remaining };
        }
        self.refresh_deadline = Some(now.saturating_add_secs(self.refresh_interval_secs));
        self.filter_deadline = None;

        match client.fetch_proposals(timeout, cancel).await {
            Ok(proposals) => {
                let count = proposals.len();
                debug!(count, "proposal list refreshed");
                self.proposals = proposals;
                Tick::Refreshed { count }
            }
            Err(e) => {
                warn!(error = %e, "proposal refresh failed");
                Tick::Failed(e)
            }
        }
    }
}

/// Whether the proposal's name or ids contain `filter`, ignoring case.
/// A blank filter matches everything.
pub fn matches_filter(proposal: &Proposal, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    needle.is_empty()
        || proposal.name.to_lowercase().contains(&needle)
        || proposal.vote_id.as_str().to_lowercase().contains(&needle)
        || proposal.id.to_lowercase().contains(&needle)
}

impl Default for ProposalCache {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_FILTER_COOLDOWN_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakegov_types::{Address, Amount, VoteId};

    #[test]
    fn filter_matches_name_and_ids_ignoring_case() {
        let p = Proposal {
            id: "id-prop-7".into(),
            vote_id: VoteId::new("prop-7").unwrap(),
            name: "Exchange Listing".into(),
            address: Address::from("payout"),
            amount: Amount::from_coins(1),
            details: String::new(),
            txid: String::new(),
            start_time: Timestamp::new(0),
            end_time: Timestamp::new(100),
            votes_affirm: 0,
            votes_oppose: 0,
        };
        assert!(matches_filter(&p, ""));
        assert!(matches_filter(&p, "  "));
        assert!(matches_filter(&p, "exchange"));
        assert!(matches_filter(&p, "PROP-7"));
        assert!(matches_filter(&p, "id-prop"));
        assert!(!matches_filter(&p, "marketing"));
    }

    #[test]
    fn fresh_cache_is_due() {
        let cache = ProposalCache::default();
        assert_eq!(cache.state(Timestamp::new(100)), CacheState::Idle);
        assert_eq!(cache.countdown_label(Timestamp::new(100)), "Refresh");
    }

    #[test]
    fn later_deadline_wins() {
        let mut cache = ProposalCache::default();
        cache.refresh_deadline = Some(Timestamp::new(160));
        cache.on_filter_changed("dev", Timestamp::new(100));
        assert_eq!(
            cache.state(Timestamp::new(100)),
            CacheState::Waiting {
                remaining: Duration::from_secs(60)
            }
        );

        cache.refresh_deadline = Some(Timestamp::new(101));
        assert_eq!(
            cache.state(Timestamp::new(101)),
            CacheState::Waiting {
                remaining: Duration::from_secs(2)
            }
        );
        assert_eq!(cache.countdown_label(Timestamp::new(101)), "Please wait... 2");
        assert_eq!(cache.state(Timestamp::new(103)), CacheState::Idle);
        assert_eq!(cache.filter(), "dev");
    }

    #[test]
    fn filter_changes_restart_cooldown() {
        let mut cache = ProposalCache::default();
        cache.on_filter_changed("a", Timestamp::new(10));
        cache.on_filter_changed("ab", Timestamp::new(12));
        assert_ne!(cache.state(Timestamp::new(14)), CacheState::Idle);
        assert_eq!(cache.state(Timestamp::new(15)), CacheState::Idle);
    }

    #[test]
    fn force_refresh_clears_deadlines() {
        let mut cache = ProposalCache::default();
        cache.refresh_deadline = Some(Timestamp::new(1_000));
        cache.on_filter_changed("x", Timestamp::new(10));
        cache.force_refresh();
        assert_eq!(cache.state(Timestamp::new(10)), CacheState::Idle);
    }
}
