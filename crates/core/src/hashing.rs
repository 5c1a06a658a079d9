//! The dub cache key.

use sha2::{Digest, Sha256};

/// Content address of a synthesized dub.
///
/// A pure function of `(text, voice_id, language_code)`: two dubs with the
/// same hash are interchangeable. Every field is length-prefixed so that
/// shifting characters between fields always changes the hash.
pub fn dub_params_hash(text: &str, voice_id: &str, language_code: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [text, voice_id, language_code] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
