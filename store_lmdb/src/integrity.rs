//! LMDB database integrity checks.
//!
//! Run on open to detect corruption before any vote is checked against the
//! ledger.

use std::path::Path;
use std::sync::Arc;

use heed::Env;

use crate::environment::{GOVERNANCE_DB, META_DB};
use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

const EXPECTED_DATABASES: &[&str] = &[GOVERNANCE_DB, META_DB];

/// Open each expected database and count its entries. Read failures are
/// recorded in the report rather than returned.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;

    for &db_name in EXPECTED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report
                .errors
                .push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }

    Ok(report)
}

/// Check that a data directory looks like an LMDB environment before opening.
///
/// A missing or empty directory is a fresh start. A non-empty directory
/// without `data.mdb` suggests the wrong path or a damaged ledger.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    if path.join("data.mdb").exists() {
        return Ok(());
    }
    let is_empty = std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    if is_empty {
        Ok(())
    } else {
        Err(format!(
            "directory {} is not empty but data.mdb is missing",
            path.display()
        ))
    }
}
