//! Governance ledger storage trait.

use crate::StoreError;
use stakegov_types::{GovernanceEntry, VoteId};

/// Result of an insert-if-absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An entry already existed for the vote id; nothing was written.
    Existing(GovernanceEntry),
}

/// Persisted record of the votes this wallet has cast, keyed by vote id.
///
/// Entries are never updated in place. The only removal is [`erase_all`].
///
/// [`erase_all`]: GovernanceStore::erase_all
pub trait GovernanceStore: Send + Sync {
    fn get_entry(&self, vote_id: &VoteId) -> Result<Option<GovernanceEntry>, StoreError>;

    fn exists(&self, vote_id: &VoteId) -> Result<bool, StoreError> {
        Ok(self.get_entry(vote_id)?.is_some())
    }

    /// Insert `entry` unless its vote id is already present. The check and
    /// the write are one atomic step with respect to other writers.
    fn insert_entry(&self, entry: &GovernanceEntry) -> Result<InsertOutcome, StoreError>;

    /// All entries, ordered by vote id.
    fn list_entries(&self) -> Result<Vec<GovernanceEntry>, StoreError>;

    /// Delete every entry and return how many were removed.
    fn erase_all(&self) -> Result<u64, StoreError>;
}
