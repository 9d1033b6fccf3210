//! LMDB implementation of MetaStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use stakegov_store::{MetaStore, StoreError};

use crate::LmdbError;

const SCHEMA_VERSION_KEY: &str = "schema_version";

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl MetaStore for LmdbMetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(SCHEMA_VERSION_KEY, &version.to_le_bytes())
    }
}
