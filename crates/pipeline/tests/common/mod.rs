//! Shared fakes and fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use voxdub_core::types::DbId;
use voxdub_core::voices::VoiceCatalog;
use voxdub_db::models::job::Job;
use voxdub_db::models::recording::CreateRecording;
use voxdub_db::models::transcript_segment::NewTranscriptSegment;
use voxdub_db::{InMemoryStore, RecordingStore, TranscriptStore};
use voxdub_events::EventBus;
use voxdub_pipeline::{Pipeline, PipelineConfig, PipelineDeps};
use voxdub_speech::{
    RecognizedSegment, SpeechError, SpeechToText, SynthesizedAudio, TextToSpeech, Transcription,
};
use voxdub_storage::LocalArtifactStore;

// ---------------------------------------------------------------------------
// Fake speech-to-text
// ---------------------------------------------------------------------------

/// Returns a scripted result for every call.
pub struct FakeStt {
    response: Mutex<Result<Vec<RecognizedSegment>, SpeechError>>,
}

impl FakeStt {
    pub fn returning(segments: Vec<RecognizedSegment>) -> Self {
        Self {
            response: Mutex::new(Ok(segments)),
        }
    }

    pub fn failing(error: SpeechError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
        }
    }

    pub fn set_segments(&self, segments: Vec<RecognizedSegment>) {
        *self.response.lock().unwrap() = Ok(segments);
    }
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(
        &self,
        _audio_ref: &str,
        language: &str,
    ) -> Result<Transcription, SpeechError> {
        let guard = self.response.lock().unwrap();
        match &*guard {
            Ok(segments) => Ok(Transcription {
                text: segments
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                confidence: Some(0.9),
                segments: segments.clone(),
                language: language.to_string(),
            }),
            Err(SpeechError::Quota { status, body }) => Err(SpeechError::Quota {
                status: *status,
                body: body.clone(),
            }),
            Err(other) => Err(SpeechError::Transport(other.to_string())),
        }
    }
}

pub fn recognized(start_ms: i64, end_ms: i64, text: &str) -> RecognizedSegment {
    RecognizedSegment {
        text: text.to_string(),
        start_ms,
        end_ms,
        confidence: Some(0.9),
    }
}

// ---------------------------------------------------------------------------
// Fake text-to-speech
// ---------------------------------------------------------------------------

/// Counts synthesis calls and fails for texts listed in `fail_on`.
#[derive(Default)]
pub struct FakeTts {
    calls: Mutex<Vec<(String, tokio::time::Instant)>>,
    fail_on: Mutex<Vec<String>>,
    duration_ms: Option<i64>,
}

impl FakeTts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporting_duration(duration_ms: i64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            ..Self::default()
        }
    }

    pub fn fail_on(&self, text: &str) {
        self.fail_on.lock().unwrap().push(text.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Time between consecutive synthesis calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|w| w[1].1 - w[0].1).collect()
    }
}

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(
        &self,
        text: &str,
        _voice_id: &str,
        _language: &str,
    ) -> Result<SynthesizedAudio, SpeechError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), tokio::time::Instant::now()));
        if self.fail_on.lock().unwrap().iter().any(|t| t == text) {
            return Err(SpeechError::Transport("synthesis backend unavailable".into()));
        }
        Ok(SynthesizedAudio {
            bytes: format!("audio:{text}").into_bytes(),
            content_type: "audio/mpeg".to_string(),
            duration_ms: self.duration_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<InMemoryStore>,
    pub events: Arc<EventBus>,
    pub stt: Arc<FakeStt>,
    pub tts: Arc<FakeTts>,
    pub artifacts_dir: TempDir,
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        dub_throttle: Duration::from_millis(20),
        ..PipelineConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_config(), FakeStt::returning(Vec::new()), FakeTts::new())
}

pub fn harness_with(config: PipelineConfig, stt: FakeStt, tts: FakeTts) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let events = Arc::new(EventBus::default());
    let stt = Arc::new(stt);
    let tts = Arc::new(tts);
    let artifacts_dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(PipelineDeps {
        store: store.clone(),
        events: Arc::clone(&events),
        stt: stt.clone(),
        tts: tts.clone(),
        artifacts: Arc::new(LocalArtifactStore::new(
            artifacts_dir.path(),
            "https://media.test/storage",
        )),
        voices: Arc::new(VoiceCatalog::default()),
        config: Arc::new(config),
    });

    Harness {
        pipeline,
        store,
        events,
        stt,
        tts,
        artifacts_dir,
    }
}

impl Harness {
    pub async fn recording(&self) -> DbId {
        self.store
            .insert_recording(&CreateRecording {
                title: "Quarterly update".to_string(),
                audio_url: "s3://audio/quarterly.wav".to_string(),
                language_code: "en".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    /// Seed segments directly, bypassing transcription.
    pub async fn seed_segments(&self, recording_id: DbId, texts: &[&str]) -> Vec<DbId> {
        let rows: Vec<NewTranscriptSegment> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| NewTranscriptSegment {
                segment_index: i as i32,
                start_ms: i as i64 * 1_000,
                end_ms: i as i64 * 1_000 + 900,
                text_original: text.to_string(),
                confidence: None,
            })
            .collect();
        self.store
            .replace_segments(recording_id, &rows)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect()
    }

    /// Queue a transcription and wait for its job to finish.
    pub async fn transcribe(&self, recording_id: DbId, language: Option<&str>) -> DbId {
        let handle = self
            .pipeline
            .transcription
            .queue_transcription(recording_id, language)
            .await
            .unwrap();
        handle.task.await.unwrap().unwrap();
        handle.job_id
    }

    pub async fn job(&self, id: DbId) -> Job {
        self.pipeline.status.get_job_status(id).await.unwrap()
    }
}
