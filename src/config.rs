use crate::domain::ports::KeyValueStoreBox;
use crate::error::Result;
use crate::infrastructure::json_file::JsonFileStore;
use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = ".droppit/store.json";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Where pending and paid bookings are kept.
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// JSON file holding the booking store.
    #[arg(long, global = true, env = "DROPPIT_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    /// Path to a RocksDB database (optional). Takes precedence over --store.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,
}

impl StoreArgs {
    /// Opens the configured backend.
    ///
    /// Without the `storage-rocksdb` feature a `--db-path` falls back to the
    /// JSON file store with a warning.
    pub fn open(&self) -> Result<KeyValueStoreBox> {
        if let Some(db_path) = &self.db_path {
            #[cfg(feature = "storage-rocksdb")]
            {
                let store = crate::infrastructure::rocksdb::RocksDBStore::open(db_path)?;
                return Ok(Box::new(store));
            }
            #[cfg(not(feature = "storage-rocksdb"))]
            tracing::warn!(
                db_path = %db_path.display(),
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to the JSON file store."
            );
        }
        Ok(Box::new(JsonFileStore::open(&self.store)?))
    }
}
