//! Local record of votes already cast, used to refuse voting twice.

use std::sync::Arc;

use stakegov_store::{GovernanceStore, InsertOutcome};
use stakegov_types::{GovernanceEntry, VoteId};
use tracing::info;

use crate::GovernanceError;

#[derive(Clone)]
pub struct GovernanceLedger {
    store: Arc<dyn GovernanceStore>,
}

impl GovernanceLedger {
    pub fn new(store: Arc<dyn GovernanceStore>) -> Self {
        Self { store }
    }

    pub fn exists(&self, vote_id: &VoteId) -> Result<bool, GovernanceError> {
        Ok(self.store.exists(vote_id)?)
    }

    pub fn get(&self, vote_id: &VoteId) -> Result<Option<GovernanceEntry>, GovernanceError> {
        Ok(self.store.get_entry(vote_id)?)
    }

    /// Persist `entry` unless one already exists for its vote id.
    pub fn write(&self, entry: &GovernanceEntry) -> Result<(), GovernanceError> {
        match self.store.insert_entry(entry)? {
            InsertOutcome::Inserted => {
                info!(vote_id = %entry.vote_id, weight = %entry.weight, "recorded vote");
                Ok(())
            }
            InsertOutcome::Existing(existing) => Err(GovernanceError::DuplicateVote {
                vote_id: existing.vote_id,
                weight: existing.weight,
            }),
        }
    }

    pub fn list(&self) -> Result<Vec<GovernanceEntry>, GovernanceError> {
        Ok(self.store.list_entries()?)
    }

    /// Remove every entry, returning how many were erased.
    pub fn erase_all(&self) -> Result<u64, GovernanceError> {
        let erased = self.store.erase_all()?;
        info!(erased, "erased local governance entries");
        Ok(erased)
    }
}
