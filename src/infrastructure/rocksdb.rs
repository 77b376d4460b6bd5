use crate::domain::ports::KeyValueStore;
use crate::error::{DropInError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding drop-in records (last-used brand, pending resume).
pub const CF_DROPIN: &str = "dropin";

/// A persistent key/value store backed by RocksDB.
///
/// Survives process death, which is what lets a flow that left for an
/// external app be resumed by a later invocation.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "dropin" column family exists.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf = ColumnFamilyDescriptor::new(CF_DROPIN, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_DROPIN).ok_or_else(|| {
            DropInError::InternalError(Box::new(std::io::Error::other(
                "Drop-in column family not found",
            )))
        })
    }
}

#[async_trait]
impl KeyValueStore for RocksDBStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf()?;
        Ok(self.db.get_cf(&cf, key.as_bytes())?)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let cf = self.cf()?;
        self.db.put_cf(&cf, key.as_bytes(), value)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let cf = self.cf()?;
        self.db.delete_cf(&cf, key.as_bytes())?;
        Ok(())
    }
}
