//! Speech-to-text.
//!
//! The HTTP client speaks the long-running-recognize protocol: submit the
//! audio reference, receive an operation name, then poll
//! `GET /v1/operations/{name}` until the operation reports `done` or the
//! configured deadline passes. Each recognition result becomes one
//! [`RecognizedSegment`] spanning its first to last word.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::SttConfig;
use crate::error::SpeechError;
use crate::http::parse_response;

// ---------------------------------------------------------------------------
// Trait and result types
// ---------------------------------------------------------------------------

/// One timed utterance from the recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedSegment {
    pub text: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub confidence: Option<f64>,
}

/// Full recognizer output for one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Concatenated transcript.
    pub text: String,
    /// Mean confidence over segments that reported one.
    pub confidence: Option<f64>,
    pub segments: Vec<RecognizedSegment>,
    /// Language the service reports having recognized.
    pub language: String,
}

/// A speech recognition service.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe the audio at `audio_ref` (a URL or bucket URI).
    async fn transcribe(&self, audio_ref: &str, language: &str)
        -> Result<Transcription, SpeechError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<RecognizeResponse>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
    #[serde(default)]
    result_end_time: Option<String>,
    #[serde(default)]
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    words: Vec<WordInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WordInfo {
    start_time: String,
    end_time: String,
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Long-running-recognize HTTP client.
pub struct HttpSpeechToText {
    client: reqwest::Client,
    config: SttConfig,
}

impl HttpSpeechToText {
    pub fn new(config: SttConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] for connection pooling.
    pub fn with_client(client: reqwest::Client, config: SttConfig) -> Self {
        Self { client, config }
    }

    fn with_key(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.query(&[("key", key.as_str())]),
            None => builder,
        }
    }

    /// Send with the time left before `deadline` as the request timeout.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        deadline: Instant,
    ) -> Result<reqwest::Response, SpeechError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.with_key(request)
            .timeout(remaining)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SpeechError::Timeout(self.config.timeout.as_secs())
                } else {
                    e.into()
                }
            })
    }

    /// Submit a recognition request, returning the operation name.
    async fn submit(
        &self,
        audio_ref: &str,
        language: &str,
        deadline: Instant,
    ) -> Result<String, SpeechError> {
        let body = serde_json::json!({
            "config": {
                "languageCode": language,
                "enableWordTimeOffsets": true,
                "enableAutomaticPunctuation": true,
            },
            "audio": { "uri": audio_ref },
        });

        let request = self
            .client
            .post(format!("{}/v1/speech:longrunningrecognize", self.config.api_url))
            .json(&body);
        let response = self.send(request, deadline).await?;
        let submitted: SubmitResponse = parse_response(response).await?;
        Ok(submitted.name)
    }

    async fn poll(&self, name: &str, deadline: Instant) -> Result<Operation, SpeechError> {
        let request = self
            .client
            .get(format!("{}/v1/operations/{}", self.config.api_url, name));
        let response = self.send(request, deadline).await?;
        parse_response(response).await
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(
        &self,
        audio_ref: &str,
        language: &str,
    ) -> Result<Transcription, SpeechError> {
        let deadline = Instant::now() + self.config.timeout;
        let name = self.submit(audio_ref, language, deadline).await?;
        tracing::debug!(operation = %name, audio_ref, "Recognition submitted");

        loop {
            let operation = self.poll(&name, deadline).await?;
            if let Some(error) = operation.error {
                return Err(SpeechError::Transport(format!(
                    "recognition operation {name} failed ({}): {}",
                    error.code, error.message
                )));
            }
            if operation.done {
                let response = operation.response.unwrap_or_default();
                return flatten_results(response, language);
            }
            if Instant::now() + self.config.poll_interval > deadline {
                return Err(SpeechError::Timeout(self.config.timeout.as_secs()));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Result flattening
// ---------------------------------------------------------------------------

/// Parse a protobuf-JSON duration such as `"1.500s"` or `"2s"` into
/// milliseconds.
pub fn parse_offset_ms(value: &str) -> Result<i64, SpeechError> {
    let invalid = || SpeechError::InvalidResponse(format!("invalid time offset '{value}'"));
    let seconds = value.strip_suffix('s').ok_or_else(invalid)?;
    let (whole, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    let whole: i64 = whole.parse().map_err(|_| invalid())?;

    // Milliseconds are the first three fractional digits.
    let mut millis = 0i64;
    for (position, digit) in fraction.chars().take(3).enumerate() {
        let digit = digit.to_digit(10).ok_or_else(invalid)? as i64;
        millis += digit * 10i64.pow(2 - position as u32);
    }
    Ok(whole * 1_000 + millis)
}

fn flatten_results(
    response: RecognizeResponse,
    requested_language: &str,
) -> Result<Transcription, SpeechError> {
    let mut segments = Vec::with_capacity(response.results.len());
    let mut language = None;
    let mut previous_end = 0i64;

    for result in response.results {
        if language.is_none() {
            language = result.language_code.clone();
        }
        let Some(best) = result.alternatives.into_iter().next() else {
            continue;
        };

        let (start_ms, end_ms) = match (best.words.first(), best.words.last()) {
            (Some(first), Some(last)) => {
                (parse_offset_ms(&first.start_time)?, parse_offset_ms(&last.end_time)?)
            }
            // Without word offsets the result spans from the previous end
            // to its own end time.
            _ => match &result.result_end_time {
                Some(end) => (previous_end, parse_offset_ms(end)?),
                None => continue,
            },
        };
        previous_end = end_ms;

        segments.push(RecognizedSegment {
            text: best.transcript.trim().to_string(),
            start_ms,
            end_ms,
            confidence: best.confidence,
        });
    }

    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let confidences: Vec<f64> = segments.iter().filter_map(|s| s.confidence).collect();
    let confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
    };

    Ok(Transcription {
        text,
        confidence,
        segments,
        language: language.unwrap_or_else(|| requested_language.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
