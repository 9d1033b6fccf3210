//! Database schema migration engine.
//!
//! Tracks a monotonically increasing schema version in the meta store and
//! runs sequential migration steps to bring an older ledger up to date.

use stakegov_store::MetaStore;

use crate::LmdbError;

/// The schema version that the current code expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub struct Migrator;

impl Migrator {
    /// Check the stored schema version and run any needed migrations.
    ///
    /// Version 0 means a fresh ledger. A version higher than
    /// [`CURRENT_SCHEMA_VERSION`] was written by a newer build and is refused.
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let current = meta_store
            .get_schema_version()
            .map_err(|e| LmdbError::Heed(e.to_string()))?;

        if current == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = current, "ledger schema is up to date");
            return Ok(());
        }

        if current > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for version in current..CURRENT_SCHEMA_VERSION {
            tracing::info!(from = version, to = version + 1, "running ledger migration");
            run_migration(version, version + 1)?;
        }

        meta_store
            .set_schema_version(CURRENT_SCHEMA_VERSION)
            .map_err(|e| LmdbError::Heed(e.to_string()))?;
        Ok(())
    }
}

fn run_migration(from: u32, to: u32) -> Result<(), LmdbError> {
    match (from, to) {
        // Initial schema: bincode GovernanceEntry keyed by vote id bytes.
        (0, 1) => Ok(()),
        _ => Err(LmdbError::Heed(format!("unknown migration: {from} -> {to}"))),
    }
}
