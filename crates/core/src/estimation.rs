//! Spoken-duration heuristic for synthesized audio.
//!
//! Only used when the text-to-speech service does not report a duration.
//! The result is an approximation and is flagged as such wherever it is
//! stored.

/// Average speaking rate assumed by [`estimate_duration_ms`].
pub const DEFAULT_WORDS_PER_SECOND: f64 = 5.0;

/// Estimate how long `text` takes to speak: `word_count / words_per_second`
/// seconds, in milliseconds.
///
/// A non-positive rate falls back to [`DEFAULT_WORDS_PER_SECOND`].
pub fn estimate_duration_ms(text: &str, words_per_second: f64) -> i64 {
    let rate = if words_per_second > 0.0 {
        words_per_second
    } else {
        DEFAULT_WORDS_PER_SECOND
    };
    let words = text.split_whitespace().count() as f64;
    ((words / rate) * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_words_is_one_second() {
        assert_eq!(estimate_duration_ms("one two three four five", 5.0), 1_000);
    }

    #[test]
    fn partial_seconds() {
        assert_eq!(estimate_duration_ms("one two", 5.0), 400);
    }

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(estimate_duration_ms("   ", 5.0), 0);
    }

    #[test]
    fn invalid_rate_uses_default() {
        assert_eq!(estimate_duration_ms("a b c d e", 0.0), 1_000);
    }

    #[test]
    fn custom_rate() {
        assert_eq!(estimate_duration_ms("a b c d e", 2.5), 2_000);
    }
}
