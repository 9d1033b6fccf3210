//! Nullable store: thread-safe in-memory ledger for testing.

use stakegov_store::{GovernanceStore, InsertOutcome, StoreError};
use stakegov_types::{GovernanceEntry, VoteId};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// An in-memory governance ledger. The map mutex makes insert-if-absent atomic.
#[derive(Default)]
pub struct NullGovernanceStore {
    entries: Mutex<BTreeMap<VoteId, GovernanceEntry>>,
}

impl NullGovernanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<VoteId, GovernanceEntry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("null store mutex poisoned".into()))
    }
}

impl GovernanceStore for NullGovernanceStore {
    fn get_entry(&self, vote_id: &VoteId) -> Result<Option<GovernanceEntry>, StoreError> {
        Ok(self.lock()?.get(vote_id).cloned())
    }

    fn insert_entry(&self, entry: &GovernanceEntry) -> Result<InsertOutcome, StoreError> {
        let mut entries = self.lock()?;
        if let Some(existing) = entries.get(&entry.vote_id) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        entries.insert(entry.vote_id.clone(), entry.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn list_entries(&self) -> Result<Vec<GovernanceEntry>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn erase_all(&self) -> Result<u64, StoreError> {
        let mut entries = self.lock()?;
        let count = entries.len() as u64;
        entries.clear();
        Ok(count)
    }
}
