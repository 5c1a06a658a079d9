//! Text-to-speech.
//!
//! The HTTP client posts to `/v1/text-to-speech/{voice_id}` with an
//! `xi-api-key` header and receives the encoded audio as the response body.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use crate::config::TtsConfig;
use crate::error::SpeechError;
use crate::http::ensure_success;

/// Content type assumed when the service does not send one.
const DEFAULT_CONTENT_TYPE: &str = "audio/mpeg";

/// Encoded audio returned by a synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Duration reported by the service, when it reports one.
    pub duration_ms: Option<i64>,
}

impl SynthesizedAudio {
    /// File extension matching the content type.
    pub fn extension(&self) -> &'static str {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        match essence {
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/ogg" | "audio/opus" => "ogg",
            "audio/flac" => "flac",
            "audio/pcm" | "audio/L16" => "pcm",
            _ => "bin",
        }
    }
}

/// A voice synthesis service.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        language: &str,
    ) -> Result<SynthesizedAudio, SpeechError>;
}

/// Voice synthesis HTTP client.
pub struct HttpTextToSpeech {
    client: reqwest::Client,
    config: TtsConfig,
}

impl HttpTextToSpeech {
    pub fn new(config: TtsConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: TtsConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TextToSpeech for HttpTextToSpeech {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        language: &str,
    ) -> Result<SynthesizedAudio, SpeechError> {
        let body = serde_json::json!({
            "text": text,
            "model_id": self.config.model_id,
            "language_code": language,
        });

        let mut request = self
            .client
            .post(format!("{}/v1/text-to-speech/{}", self.config.api_url, voice_id))
            .header(ACCEPT, DEFAULT_CONTENT_TYPE)
            .timeout(self.config.timeout)
            .json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("xi-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SpeechError::Timeout(self.config.timeout.as_secs())
            } else {
                e.into()
            }
        })?;
        let response = ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "synthesis returned an empty body".to_string(),
            ));
        }

        tracing::debug!(voice_id, language, size = bytes.len(), "Speech synthesized");
        Ok(SynthesizedAudio {
            bytes,
            content_type,
            duration_ms: None,
        })
    }
}
