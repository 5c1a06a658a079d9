/// Errors from an artifact store backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),

    /// The key is empty, absolute or escapes the storage root.
    #[error("Invalid artifact path '{0}'")]
    InvalidPath(String),
}
