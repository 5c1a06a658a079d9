//! S3-compatible artifact store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::StorageError;
use crate::path::{public_url, validate_key};
use crate::{ArtifactStore, StoredArtifact};

/// Uploads artifacts with `PutObject`.
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3ArtifactStore {
    /// Build a client from the default credential chain.
    ///
    /// `endpoint` targets an S3-compatible service (MinIO, R2) and switches
    /// to path-style addressing. An empty `public_base_url` falls back to
    /// the virtual-hosted AWS URL of the bucket.
    pub async fn connect(
        bucket: String,
        region: String,
        endpoint: Option<String>,
        public_base_url: String,
    ) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let public_base_url = if public_base_url.is_empty() {
            format!("https://{bucket}.s3.{region}.amazonaws.com")
        } else {
            public_base_url
        };

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket,
            public_base_url,
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredArtifact, StorageError> {
        validate_key(path)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::S3(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(bucket = %self.bucket, key = path, size = bytes.len(), "Artifact uploaded");
        Ok(StoredArtifact {
            path: path.to_string(),
            url: public_url(&self.public_base_url, path),
            size_bytes: bytes.len(),
        })
    }
}
