use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rocksdb::{Options, DB};

use crate::{Handle, IndexError, IndexResult, ReferenceIndex};

/// Index persisted in a local RocksDB keyspace.
///
/// Keys are filenames, values are the raw handle bytes. Single-key put/get
/// atomicity comes from RocksDB itself.
#[derive(Clone)]
pub struct RocksIndex {
    db: Arc<DB>,
}

impl RocksIndex {
    /// Opens (or creates) the index database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> IndexResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| IndexError::StorageUnavailable(e.to_string()))?;
        tracing::info!("opened reference index at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl ReferenceIndex for RocksIndex {
    async fn put(&self, name: &str, handle: Handle) -> IndexResult<()> {
        self.db
            .put(name.as_bytes(), handle.as_str().as_bytes())
            .map_err(|e| IndexError::StorageUnavailable(e.to_string()))
    }

    async fn get(&self, name: &str) -> IndexResult<Handle> {
        match self.db.get(name.as_bytes()) {
            Ok(Some(raw)) => {
                let value = String::from_utf8(raw)
                    .map_err(|e| IndexError::StorageUnavailable(e.to_string()))?;
                Ok(Handle::from(value))
            }
            Ok(None) => Err(IndexError::NotFound(name.to_string())),
            Err(e) => Err(IndexError::StorageUnavailable(e.to_string())),
        }
    }
}
