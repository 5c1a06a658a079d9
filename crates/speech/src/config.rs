//! Adapter configuration loaded from the environment.

use std::time::Duration;

use voxdub_core::env;
use voxdub_core::error::CoreError;

/// Default deadline for one recognition.
pub const DEFAULT_STT_TIMEOUT_SECS: u64 = 600;

/// Speech-to-text service settings.
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Base URL, without a trailing slash.
    pub api_url: String,
    pub api_key: Option<String>,
    /// Delay between operation polls.
    pub poll_interval: Duration,
    /// Deadline for one recognition, submit included.
    pub timeout: Duration,
}

impl SttConfig {
    /// | Env Var                | Default                           |
    /// |------------------------|-----------------------------------|
    /// | `STT_API_URL`          | `https://speech.googleapis.com`   |
    /// | `STT_API_KEY`          | unset                             |
    /// | `STT_POLL_INTERVAL_MS` | `2000`                            |
    /// | `STT_TIMEOUT_SECS`     | `600`                             |
    pub fn try_from_env() -> Result<Self, CoreError> {
        Ok(Self {
            api_url: trim_base(env::var("STT_API_URL"), "https://speech.googleapis.com"),
            api_key: env::var("STT_API_KEY"),
            poll_interval: Duration::from_millis(env::parse_or("STT_POLL_INTERVAL_MS", 2_000)?),
            timeout: Duration::from_secs(env::parse_or("STT_TIMEOUT_SECS", DEFAULT_STT_TIMEOUT_SECS)?),
        })
    }
}

/// Text-to-speech service settings.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model_id: String,
    /// Timeout for one synthesis request.
    pub timeout: Duration,
}

impl TtsConfig {
    /// | Env Var            | Default                     |
    /// |--------------------|-----------------------------|
    /// | `TTS_API_URL`      | `https://api.elevenlabs.io` |
    /// | `TTS_API_KEY`      | unset                       |
    /// | `TTS_MODEL_ID`     | `eleven_multilingual_v2`    |
    /// | `TTS_TIMEOUT_SECS` | `120`                       |
    pub fn try_from_env() -> Result<Self, CoreError> {
        Ok(Self {
            api_url: trim_base(env::var("TTS_API_URL"), "https://api.elevenlabs.io"),
            api_key: env::var("TTS_API_KEY"),
            model_id: env::var("TTS_MODEL_ID").unwrap_or_else(|| "eleven_multilingual_v2".into()),
            timeout: Duration::from_secs(env::parse_or("TTS_TIMEOUT_SECS", 120)?),
        })
    }
}

fn trim_base(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}
