//! Typed environment variable lookup for `try_from_env` constructors.

use std::str::FromStr;

use crate::error::CoreError;

/// Read `name`, returning `None` when unset or blank.
pub fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse `name`, falling back to `default` when unset.
///
/// A value that is set but unparsable is a validation error naming the
/// variable, never a silent fallback.
pub fn parse_or<T: FromStr>(name: &str, default: T) -> Result<T, CoreError> {
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| CoreError::Validation(format!("{name} has an invalid value '{raw}'"))),
    }
}

/// Read `name` or fail with a validation error.
pub fn required(name: &str) -> Result<String, CoreError> {
    var(name).ok_or_else(|| CoreError::Validation(format!("{name} must be set")))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    // Each test uses its own variable name; the process environment is
    // shared between test threads.

    #[test]
    fn unset_variable_uses_default() {
        assert_eq!(parse_or("VOXDUB_TEST_UNSET_PORT", 3000u16).unwrap(), 3000);
    }

    #[test]
    fn set_variable_is_parsed() {
        std::env::set_var("VOXDUB_TEST_PARSED_MS", " 750 ");
        assert_eq!(parse_or("VOXDUB_TEST_PARSED_MS", 500i64).unwrap(), 750);
    }

    #[test]
    fn unparsable_variable_is_rejected() {
        std::env::set_var("VOXDUB_TEST_BAD_FLAG", "maybe");
        assert_matches!(
            parse_or("VOXDUB_TEST_BAD_FLAG", false),
            Err(CoreError::Validation(msg)) if msg.contains("VOXDUB_TEST_BAD_FLAG")
        );
    }

    #[test]
    fn blank_required_variable_is_missing() {
        std::env::set_var("VOXDUB_TEST_BLANK", "  ");
        assert!(required("VOXDUB_TEST_BLANK").is_err());
        assert!(var("VOXDUB_TEST_BLANK").is_none());
    }
}
