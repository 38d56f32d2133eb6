use std::error::Error;

use async_trait::async_trait;

use crate::local_store::LocalBlobStore;
use crate::s3_store::S3BlobStore;

pub type BlobResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Trait for storing and fetching blobs by opaque handle.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a blob and returns the handle that references it.
    async fn put_blob(&self, data: &[u8]) -> BlobResult<String>;

    /// Retrieves a blob by its handle.
    async fn get_blob(&self, handle: &str) -> BlobResult<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub enum BlobStores {
    Local(LocalBlobStore),
    S3(S3BlobStore),
}

impl BlobStores {
    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn BlobStore {
        match self {
            BlobStores::Local(a) => a,
            BlobStores::S3(b) => b,
        }
    }
}
