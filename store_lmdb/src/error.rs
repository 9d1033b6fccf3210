use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for stakegov_store::StoreError {
    fn from(e: LmdbError) -> Self {
        use stakegov_store::StoreError;
        match e {
            LmdbError::NotFound(k) => StoreError::NotFound(k),
            LmdbError::Serialization(m) => StoreError::Serialization(m),
            LmdbError::Corruption(m) => StoreError::Corruption(m),
            LmdbError::SchemaTooNew { found, supported } => StoreError::SchemaVersion {
                found,
                expected: supported,
            },
            other => StoreError::Backend(other.to_string()),
        }
    }
}
