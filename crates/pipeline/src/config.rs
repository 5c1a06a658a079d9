//! Pipeline tunables.

use std::time::Duration;

use voxdub_core::env;
use voxdub_core::error::CoreError;
use voxdub_core::estimation::DEFAULT_WORDS_PER_SECOND;
use voxdub_core::language::{validate_language_code, DEFAULT_LANGUAGE};
use voxdub_core::timeline::DEFAULT_GAP_THRESHOLD_MS;
use voxdub_speech::DEFAULT_STT_TIMEOUT_SECS;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Silence between segments above which timing validation reports a gap.
    pub gap_threshold_ms: i64,
    /// Delay before each synthesis call of a fan-out after the first.
    pub dub_throttle: Duration,
    /// Speaking rate for duration estimates.
    pub words_per_second: f64,
    /// Language used when a transcription request names none.
    pub default_language: String,
    /// Fold duplicate-text micro-segments before writing a transcript.
    pub merge_duplicate_segments: bool,
    /// A `running` job not updated for this long is failed by the watchdog.
    pub stale_job_timeout: Duration,
    pub watchdog_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gap_threshold_ms: DEFAULT_GAP_THRESHOLD_MS,
            dub_throttle: Duration::from_millis(500),
            words_per_second: DEFAULT_WORDS_PER_SECOND,
            default_language: DEFAULT_LANGUAGE.to_string(),
            merge_duplicate_segments: false,
            stale_job_timeout: Duration::from_secs(30 * 60),
            watchdog_interval: Duration::from_secs(60),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `TIMING_GAP_THRESHOLD_MS`  | `500`   |
    /// | `DUB_THROTTLE_MS`          | `500`   |
    /// | `WORDS_PER_SECOND`         | `5`     |
    /// | `DEFAULT_LANGUAGE`         | `en`    |
    /// | `MERGE_DUPLICATE_SEGMENTS` | `false` |
    /// | `STALE_JOB_TIMEOUT_SECS`   | `1800`  |
    /// | `WATCHDOG_INTERVAL_SECS`   | `60`    |
    ///
    /// `STALE_JOB_TIMEOUT_SECS` must exceed `STT_TIMEOUT_SECS`, otherwise the
    /// watchdog could fail a job whose recognition is still in flight.
    pub fn try_from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();

        let gap_threshold_ms: i64 =
            env::parse_or("TIMING_GAP_THRESHOLD_MS", defaults.gap_threshold_ms)?;
        if gap_threshold_ms < 0 {
            return Err(CoreError::Validation(
                "TIMING_GAP_THRESHOLD_MS must not be negative".into(),
            ));
        }

        let words_per_second: f64 = env::parse_or("WORDS_PER_SECOND", defaults.words_per_second)?;
        if !(words_per_second.is_finite() && words_per_second > 0.0) {
            return Err(CoreError::Validation(
                "WORDS_PER_SECOND must be a positive number".into(),
            ));
        }

        let default_language = env::var("DEFAULT_LANGUAGE").unwrap_or(defaults.default_language);
        validate_language_code(&default_language)?;

        let watchdog_secs: u64 = env::parse_or("WATCHDOG_INTERVAL_SECS", 60)?;
        if watchdog_secs == 0 {
            return Err(CoreError::Validation(
                "WATCHDOG_INTERVAL_SECS must be at least 1".into(),
            ));
        }

        let stale_job_timeout =
            Duration::from_secs(env::parse_or("STALE_JOB_TIMEOUT_SECS", 1_800)?);
        let stt_timeout =
            Duration::from_secs(env::parse_or("STT_TIMEOUT_SECS", DEFAULT_STT_TIMEOUT_SECS)?);
        check_stale_timeout(stale_job_timeout, stt_timeout)?;

        Ok(Self {
            gap_threshold_ms,
            dub_throttle: Duration::from_millis(env::parse_or("DUB_THROTTLE_MS", 500)?),
            words_per_second,
            default_language,
            merge_duplicate_segments: env::parse_or("MERGE_DUPLICATE_SEGMENTS", false)?,
            stale_job_timeout,
            watchdog_interval: Duration::from_secs(watchdog_secs),
        })
    }
}

fn check_stale_timeout(stale_job_timeout: Duration, stt_timeout: Duration) -> Result<(), CoreError> {
    if stale_job_timeout <= stt_timeout {
        return Err(CoreError::Validation(format!(
            "STALE_JOB_TIMEOUT_SECS ({}) must be greater than STT_TIMEOUT_SECS ({})",
            stale_job_timeout.as_secs(),
            stt_timeout.as_secs()
        )));
    }
    Ok(())
}
