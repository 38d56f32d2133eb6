use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::store::{BlobResult, BlobStore};

/// A `BlobStore` implementation that writes content-addressed files into a
/// local directory. The handle is the lowercase-hex SHA-256 of the content.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    directory: PathBuf,
}

impl LocalBlobStore {
    /// Creates a new `LocalBlobStore` targeting the specified directory.
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn blob_path(&self, handle: &str) -> PathBuf {
        let mut path = self.directory.clone();
        path.push(handle);
        path
    }
}

/// Hex-encodes a digest into the handle form used by the bundled stores.
pub fn content_handle(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_blob(&self, data: &[u8]) -> BlobResult<String> {
        let handle = content_handle(data);
        fs::create_dir_all(&self.directory).await?;
        fs::write(self.blob_path(&handle), data).await?;
        Ok(handle)
    }

    async fn get_blob(&self, handle: &str) -> BlobResult<Vec<u8>> {
        let data = fs::read(self.blob_path(handle)).await?;
        Ok(data)
    }
}
