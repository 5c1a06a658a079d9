//! Filesystem artifact store.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;
use crate::path::{public_url, validate_key};
use crate::{ArtifactStore, StoredArtifact};

/// Writes artifacts below `root`; URLs are `public_base_url/{key}`.
pub struct LocalArtifactStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(
        &self,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<StoredArtifact, StorageError> {
        validate_key(path)?;
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Readers never see a partial artifact: write and sync a sibling
        // staging file, then rename it into place.
        let staging = target.with_extension("partial");
        let written = async {
            let mut file = tokio::fs::File::create(&staging).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&staging, &target).await
        }
        .await;
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                tracing::debug!(path, error = %cleanup, "Staging file not removed");
            }
            return Err(e.into());
        }

        tracing::debug!(path, size = bytes.len(), "Artifact written to local storage");
        Ok(StoredArtifact {
            path: path.to_string(),
            url: public_url(&self.public_base_url, path),
            size_bytes: bytes.len(),
        })
    }
}
