use crate::domain::ports::KeyValueStore;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the checkout's key-value entries.
pub const CF_STORAGE: &str = "storage";

/// A persistent key-value store backed by RocksDB.
///
/// Entries live in their own column family, keyed by the UTF-8 key.
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_storage = ColumnFamilyDescriptor::new(CF_STORAGE, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_storage])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_STORAGE).ok_or_else(|| {
            CheckoutError::InternalError(Box::new(std::io::Error::other(
                "Storage column family not found",
            )))
        })
    }
}

#[async_trait]
impl KeyValueStore for RocksDBStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cf = self.cf()?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => {
                let value = String::from_utf8(bytes).map_err(|e| {
                    CheckoutError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Stored value is not UTF-8: {}", e),
                    )))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        let cf = self.cf()?;
        self.db.put_cf(cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let cf = self.cf()?;
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_STORAGE).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        store.put("a", "1".to_string()).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        assert!(store.get("b").await.unwrap().is_none());

        store.remove("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.put("a", "1".to_string()).await.unwrap();
        }
        let store = RocksDBStore::open(dir.path()).unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
