use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use crate::local_store::content_handle;
use crate::store::{BlobResult, BlobStore};

/// A `BlobStore` implementation that keeps blobs in an S3-compatible bucket.
#[derive(Clone, Debug)]
pub struct S3BlobStore {
    s3_client: S3Client,
    bucket: String,
    bucket_ready: Arc<tokio::sync::Mutex<bool>>,
}

/// Creates an S3 client. When `endpoint_url` is set it points the client at an
/// S3-compatible server (e.g. MinIO), which requires path-style addressing.
pub async fn create_s3_client(endpoint_url: Option<&str>) -> S3Client {
    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let base_config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;

    match endpoint_url {
        Some(endpoint) => {
            let config = Builder::from(&base_config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            S3Client::from_conf(config)
        }
        None => S3Client::new(&base_config),
    }
}

impl S3BlobStore {
    /// Creates a new `S3BlobStore`.
    pub fn new(s3_client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            s3_client,
            bucket: bucket.into(),
            bucket_ready: Arc::new(tokio::sync::Mutex::new(false)),
        }
    }

    async fn ensure_bucket_exists(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut ready = self.bucket_ready.lock().await;

        if *ready {
            return Ok(());
        }

        match self
            .s3_client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(_) => {
                *ready = true;
                Ok(())
            }
            Err(SdkError::ServiceError(service_err)) => {
                if service_err.err().is_not_found() {
                    self.s3_client
                        .create_bucket()
                        .bucket(&self.bucket)
                        .send()
                        .await?;

                    *ready = true;
                    Ok(())
                } else {
                    Err(SdkError::ServiceError(service_err).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_blob(&self, data: &[u8]) -> BlobResult<String> {
        self.ensure_bucket_exists().await?;

        let handle = content_handle(data);
        tracing::info!("uploading blob {} to bucket {}", handle, self.bucket);
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(&handle)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await?;
        Ok(handle)
    }

    async fn get_blob(&self, handle: &str) -> BlobResult<Vec<u8>> {
        self.ensure_bucket_exists().await?;

        tracing::info!("fetching blob {} from bucket {}", handle, self.bucket);
        let resp = self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(handle)
            .send()
            .await?;
        let data = resp.body.collect().await?.into_bytes().to_vec();
        Ok(data)
    }
}
