//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::integrity::{check_data_dir, check_integrity};
use crate::migration::Migrator;
use crate::{LmdbError, LmdbGovernanceStore, LmdbMetaStore};

pub const GOVERNANCE_DB: &str = "governance_entries";
pub const META_DB: &str = "meta";

/// Default map size: the ledger holds one small record per proposal voted on.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;
pub const DEFAULT_MAX_DBS: u32 = 4;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
    governance_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory if needed, opens every database, brings the
    /// schema up to date and runs an integrity pass.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        check_data_dir(path).map_err(LmdbError::Corruption)?;
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path and
        // the memory map is never truncated behind heed's back.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let governance_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(GOVERNANCE_DB))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            governance_db,
            meta_db,
        };

        Migrator::run(&environment.meta_store())?;

        let report = check_integrity(&environment.env)?;
        if !report.is_healthy() {
            for error in &report.errors {
                tracing::error!(%error, "ledger integrity check failed");
            }
            return Err(LmdbError::Corruption(report.errors.join("; ")));
        }
        tracing::debug!(
            path = %path.display(),
            databases = report.databases_checked,
            entries = report.total_entries,
            "opened governance ledger"
        );

        Ok(environment)
    }

    pub fn open_default(path: &Path) -> Result<Self, LmdbError> {
        Self::open(path, DEFAULT_MAX_DBS, DEFAULT_MAP_SIZE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn governance_store(&self) -> LmdbGovernanceStore {
        LmdbGovernanceStore {
            env: Arc::clone(&self.env),
            db: self.governance_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
