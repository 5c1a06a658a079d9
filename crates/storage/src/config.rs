//! Storage backend selection from the environment.

use std::path::PathBuf;

use voxdub_core::env;
use voxdub_core::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Prefix for artifact URLs. Empty means backend default (S3 only).
    pub public_base_url: String,
}

impl StorageConfig {
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `STORAGE_BACKEND`         | `local` (`local` or `s3`)        |
    /// | `STORAGE_LOCAL_PATH`      | `storage`                        |
    /// | `STORAGE_PUBLIC_BASE_URL` | `http://localhost:3000/storage` for local, bucket URL for s3 |
    /// | `S3_BUCKET`               | required for `s3`                |
    /// | `S3_REGION`               | `us-east-1`                      |
    /// | `S3_ENDPOINT`             | unset                            |
    pub fn try_from_env() -> Result<Self, CoreError> {
        let backend = match env::var("STORAGE_BACKEND").as_deref().unwrap_or("local") {
            "local" => StorageBackend::Local {
                root: PathBuf::from(
                    env::var("STORAGE_LOCAL_PATH").unwrap_or_else(|| "storage".into()),
                ),
            },
            "s3" => StorageBackend::S3 {
                bucket: env::required("S3_BUCKET")?,
                region: env::var("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
                endpoint: env::var("S3_ENDPOINT"),
            },
            other => {
                return Err(CoreError::Validation(format!(
                    "STORAGE_BACKEND must be 'local' or 's3', got '{other}'"
                )))
            }
        };

        let public_base_url = match (&backend, env::var("STORAGE_PUBLIC_BASE_URL")) {
            (_, Some(url)) => url,
            (StorageBackend::Local { .. }, None) => "http://localhost:3000/storage".to_string(),
            (StorageBackend::S3 { .. }, None) => String::new(),
        };

        Ok(Self {
            backend,
            public_base_url,
        })
    }
}
