//! Artifact storage for synthesized audio.
//!
//! [`ArtifactStore`] writes bytes under a relative key and returns the
//! public URL the Dub row records. Two backends:
//!
//! - [`LocalArtifactStore`] — a directory on disk (development, tests).
//! - [`S3ArtifactStore`] — an S3-compatible bucket.

pub mod config;
pub mod error;
pub mod local;
pub mod path;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;

pub use config::{StorageBackend, StorageConfig};
pub use error::StorageError;
pub use local::LocalArtifactStore;
pub use path::dub_artifact_path;
pub use s3::S3ArtifactStore;

/// Where a written artifact can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Relative key the bytes were written under.
    pub path: String,
    pub url: String,
    pub size_bytes: usize,
}

/// Durable storage for generated files.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write `bytes` at `path`. A returned `Ok` means the bytes are durable.
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredArtifact, StorageError>;
}

/// Build the backend selected by `config`.
pub async fn build_artifact_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ArtifactStore>, StorageError> {
    match &config.backend {
        StorageBackend::Local { root } => Ok(Arc::new(LocalArtifactStore::new(
            root.clone(),
            config.public_base_url.clone(),
        ))),
        StorageBackend::S3 {
            bucket,
            region,
            endpoint,
        } => {
            let store = S3ArtifactStore::connect(
                bucket.clone(),
                region.clone(),
                endpoint.clone(),
                config.public_base_url.clone(),
            )
            .await;
            Ok(Arc::new(store))
        }
    }
}
