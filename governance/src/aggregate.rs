//! Vote weight aggregation over records returned by the coordination service.

use std::collections::HashSet;

use stakegov_types::{Address, Amount, VoteId, VoteRecord};

/// Sum of `weight` over records for `vote_id`; zero when none match.
pub fn aggregate_weight(vote_id: &VoteId, records: &[VoteRecord]) -> Amount {
    records
        .iter()
        .filter(|r| r.vote_id == *vote_id)
        .map(|r| r.weight)
        .sum()
}

/// Outcome of a submission, split by which submitted addresses were counted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tally {
    pub weight: Amount,
    pub counted: Vec<Address>,
    /// Submitted addresses the service returned no record for.
    pub uncounted: Vec<Address>,
}

/// The service returns one record per accepted ballot, so a submitted address
/// without a matching record was not counted.
pub fn tally(vote_id: &VoteId, submitted: &[Address], records: &[VoteRecord]) -> Tally {
    let returned: HashSet<&Address> = records
        .iter()
        .filter(|r| r.vote_id == *vote_id)
        .map(|r| &r.address)
        .collect();
    let (counted, uncounted) = submitted
        .iter()
        .cloned()
        .partition(|a| returned.contains(a));
    Tally {
        weight: aggregate_weight(vote_id, records),
        counted,
        uncounted,
    }
}
