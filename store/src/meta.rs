//! Metadata storage trait.

use crate::StoreError;

/// Key-value bookkeeping that doesn't belong to the ledger itself.
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Current schema version; 0 when never written.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}
