#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use voxdub_api::config::ServerConfig;
use voxdub_api::router::build_app_router;
use voxdub_api::state::AppState;
use voxdub_core::types::DbId;
use voxdub_core::voices::VoiceCatalog;
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
// Fake adapters
// ---------------------------------------------------------------------------

/// Recognizes the scripted segments, or none, after an optional delay.
#[derive(Default)]
pub struct ScriptedStt {
    pub segments: Mutex<Vec<RecognizedSegment>>,
    pub delay: Mutex<Option<Duration>>,
}

#[async_trait]
impl SpeechToText for ScriptedStt {
    async fn transcribe(&self, _audio_ref: &str, language: &str) -> Result<Transcription, SpeechError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let segments = self.segments.lock().unwrap().clone();
        Ok(Transcription {
            text: String::new(),
            confidence: None,
            segments,
            language: language.to_string(),
        })
    }
}

/// Synthesizes `audio:{text}`, failing for texts starting with `!`.
#[derive(Default)]
pub struct EchoTts {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl TextToSpeech for EchoTts {
    async fn synthesize(
        &self,
        text: &str,
        _voice_id: &str,
        _language: &str,
    ) -> Result<SynthesizedAudio, SpeechError> {
        *self.calls.lock().unwrap() += 1;
        if text.starts_with('!') {
            return Err(SpeechError::Quota {
                status: 429,
                body: "slow down".into(),
            });
        }
        Ok(SynthesizedAudio {
            bytes: format!("audio:{text}").into_bytes(),
            content_type: "audio/mpeg".to_string(),
            duration_ms: None,
        })
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub events: Arc<EventBus>,
    pub stt: Arc<ScriptedStt>,
    pub tts: Arc<EchoTts>,
    pub artifacts_dir: TempDir,
}

/// Build the full application router over the in-memory store and fake
/// adapters, with the production middleware stack.
pub fn build_test_app() -> TestApp {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let events = Arc::new(EventBus::default());
    let stt = Arc::new(ScriptedStt::default());
    let tts = Arc::new(EchoTts::default());
    let artifacts_dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(PipelineDeps {
        store: store.clone(),
        events: Arc::clone(&events),
        stt: stt.clone(),
        tts: tts.clone(),
        artifacts: Arc::new(LocalArtifactStore::new(
            artifacts_dir.path(),
            "http://localhost:3000/media",
        )),
        voices: Arc::new(VoiceCatalog::default()),
        config: Arc::new(PipelineConfig {
            dub_throttle: Duration::from_millis(1),
            ..PipelineConfig::default()
        }),
    });

    let state = AppState {
        pipeline,
        event_bus: Arc::clone(&events),
        pool: None,
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config).unwrap(),
        store,
        events,
        stt,
        tts,
        artifacts_dir,
    }
}

impl TestApp {
    pub async fn recording(&self) -> DbId {
        self.store
            .insert_recording(&CreateRecording {
                title: "Interview".to_string(),
                audio_url: "file:///audio/interview.wav".to_string(),
                language_code: "en".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    pub async fn seed_segments(&self, recording_id: DbId, texts: &[&str]) -> Vec<DbId> {
        let rows: Vec<NewTranscriptSegment> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| NewTranscriptSegment {
                segment_index: i as i32,
                start_ms: i as i64 * 2_000,
                end_ms: i as i64 * 2_000 + 1_800,
                text_original: text.to_string(),
                confidence: Some(0.8),
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
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `GET /api/v1/jobs/{id}` until the job is `completed` or `failed`,
/// returning the last job body.
pub async fn wait_for_terminal(app: &Router, job_id: i64) -> serde_json::Value {
    let mut job = serde_json::Value::Null;
    for _ in 0..500 {
        job = body_json(get(app.clone(), &format!("/api/v1/jobs/{job_id}")).await).await;
        let status = job["data"]["status"].as_str().unwrap_or_default();
        if status == "completed" || status == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    job
}
