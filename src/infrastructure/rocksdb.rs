use crate::domain::ports::KeyValueStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{DB, Options};
use std::path::Path;
use std::sync::Arc;

/// A persistent key-value store backed by RocksDB.
///
/// Values are the UTF-8 JSON documents written by the simulator, stored in
/// the default column family.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path).map_err(|e| PaymentError::Storage(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl KeyValueStore for RocksDBStore {
    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.db
            .put(key.as_bytes(), value.as_bytes())
            .map_err(|e| PaymentError::Storage(format!("RocksDB write error: {}", e)))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let result = self
            .db
            .get(key.as_bytes())
            .map_err(|e| PaymentError::Storage(format!("RocksDB read error: {}", e)))?;

        match result {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                PaymentError::Storage(format!("Stored value is not UTF-8: {}", e))
            }),
            None => Ok(None),
        }
    }
}
