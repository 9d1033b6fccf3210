//! LMDB implementation of GovernanceStore.
//!
//! Key = vote id bytes, value = bincode `GovernanceEntry`.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use stakegov_store::{GovernanceStore, InsertOutcome, StoreError};
use stakegov_types::{GovernanceEntry, VoteId};

use crate::LmdbError;

pub struct LmdbGovernanceStore {
    pub(crate) env: Arc<Env>,
    pub(crate) db: Database<Bytes, Bytes>,
}

fn decode(bytes: &[u8]) -> Result<GovernanceEntry, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

impl GovernanceStore for LmdbGovernanceStore {
    fn get_entry(&self, vote_id: &VoteId) -> Result<Option<GovernanceEntry>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let entry = match self.db.get(&rtxn, vote_id.as_bytes()).map_err(LmdbError::from)? {
            Some(bytes) => Some(decode(bytes)?),
            None => None,
        };
        Ok(entry)
    }

    fn insert_entry(&self, entry: &GovernanceEntry) -> Result<InsertOutcome, StoreError> {
        let value = bincode::serialize(entry).map_err(LmdbError::from)?;
        // LMDB allows one write transaction at a time, so the lookup and the
        // put below cannot interleave with another writer.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = match self
            .db
            .get(&wtxn, entry.vote_id.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Some(decode(bytes)?),
            None => None,
        };
        if let Some(existing) = existing {
            wtxn.abort();
            tracing::debug!(vote_id = %entry.vote_id, "ledger entry already present");
            return Ok(InsertOutcome::Existing(existing));
        }
        self.db
            .put(&mut wtxn, entry.vote_id.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(InsertOutcome::Inserted)
    }

    fn list_entries(&self) -> Result<Vec<GovernanceEntry>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for item in self.db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, value) = item.map_err(LmdbError::from)?;
            entries.push(decode(value)?);
        }
        Ok(entries)
    }

    fn erase_all(&self) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let count = self.db.len(&wtxn).map_err(LmdbError::from)?;
        self.db.clear(&mut wtxn).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(count)
    }
}
