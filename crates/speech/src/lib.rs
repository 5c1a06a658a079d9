//! Speech service adapters.
//!
//! - [`SpeechToText`] / [`TextToSpeech`] — the async traits the pipeline
//!   calls. Implementations must be `Send + Sync`; the pipeline holds them
//!   as `Arc<dyn …>`.
//! - [`stt::HttpSpeechToText`] — long-running-recognize client with
//!   operation polling.
//! - [`tts::HttpTextToSpeech`] — voice synthesis client returning raw audio.
//! - [`SpeechError`] — adapter failures, classified into the job
//!   [`FailureKind`](voxdub_core::failure::FailureKind) taxonomy.

pub mod config;
pub mod error;
mod http;
pub mod stt;
pub mod tts;

pub use config::{SttConfig, TtsConfig, DEFAULT_STT_TIMEOUT_SECS};
pub use error::SpeechError;
pub use stt::{RecognizedSegment, SpeechToText, Transcription};
pub use tts::{SynthesizedAudio, TextToSpeech};
