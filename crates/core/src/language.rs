//! Language code validation and normalization.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::CoreError;

/// Language used when a request does not name one and as the voice
/// fallback set.
pub const DEFAULT_LANGUAGE: &str = "en";

fn language_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("language pattern is valid")
    })
}

/// Validate a BCP-47 style code such as `en`, `fr`, `pt-BR` or `zh-Hans`.
pub fn validate_language_code(code: &str) -> Result<(), CoreError> {
    if language_pattern().is_match(code) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid language code '{code}'. Expected e.g. 'en' or 'pt-BR'"
        )))
    }
}

/// Primary subtag of a language code (`pt-BR` -> `pt`).
pub fn primary_subtag(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}
