//! Artifact key construction and validation.

use uuid::Uuid;

use crate::error::StorageError;

/// Key for a newly synthesized dub: `dubs/{language}/{unix_millis}-{uuid}.{ext}`.
pub fn dub_artifact_path(language_code: &str, extension: &str) -> String {
    format!(
        "dubs/{}/{}-{}.{}",
        language_code,
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        extension
    )
}

/// Reject keys that are empty, absolute, contain `..` or empty segments,
/// or use backslashes.
pub fn validate_key(path: &str) -> Result<(), StorageError> {
    let invalid = || StorageError::InvalidPath(path.to_string());
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(invalid());
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(invalid());
    }
    Ok(())
}

/// Join a public base URL and a key with exactly one slash.
pub(crate) fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
