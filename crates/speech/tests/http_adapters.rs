//! HTTP adapter tests against a local stand-in service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use voxdub_speech::stt::HttpSpeechToText;
use voxdub_speech::tts::HttpTextToSpeech;
use voxdub_speech::{SpeechError, SpeechToText, SttConfig, TextToSpeech, TtsConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn stt_config(api_url: String, timeout: Duration) -> SttConfig {
    SttConfig {
        api_url,
        api_key: Some("stt-key".to_string()),
        poll_interval: Duration::from_millis(10),
        timeout,
    }
}

// ---------------------------------------------------------------------------
// Speech-to-text
// ---------------------------------------------------------------------------

async fn operation(
    State(polls): State<Arc<AtomicUsize>>,
    Path(name): Path<String>,
) -> Json<serde_json::Value> {
    assert_eq!(name, "op-7");
    // First poll reports the operation still running.
    if polls.fetch_add(1, Ordering::SeqCst) == 0 {
        return Json(serde_json::json!({ "name": name, "done": false }));
    }
    Json(serde_json::json!({
        "name": name,
        "done": true,
        "response": {
            "results": [{
                "alternatives": [{
                    "transcript": "bonjour",
                    "confidence": 0.92,
                    "words": [{ "startTime": "0.250s", "endTime": "1.500s", "word": "bonjour" }]
                }],
                "languageCode": "fr-fr"
            }]
        }
    }))
}

#[tokio::test]
async fn transcribe_polls_until_done() {
    let polls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v1/speech:longrunningrecognize",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["config"]["languageCode"], "fr");
                assert_eq!(body["audio"]["uri"], "gs://audio/a.wav");
                Json(serde_json::json!({ "name": "op-7" }))
            }),
        )
        .route("/v1/operations/{name}", get(operation))
        .with_state(Arc::clone(&polls));
    let base = serve(app).await;

    let stt = HttpSpeechToText::new(stt_config(base, Duration::from_secs(5)));
    let transcription = stt.transcribe("gs://audio/a.wav", "fr").await.unwrap();

    assert_eq!(polls.load(Ordering::SeqCst), 2);
    assert_eq!(transcription.language, "fr-fr");
    assert_eq!(transcription.segments.len(), 1);
    assert_eq!(transcription.segments[0].start_ms, 250);
    assert_eq!(transcription.segments[0].end_ms, 1_500);
}

#[tokio::test]
async fn transcribe_times_out_when_operation_never_finishes() {
    let app = Router::new()
        .route(
            "/v1/speech:longrunningrecognize",
            post(|| async { Json(serde_json::json!({ "name": "op-slow" })) }),
        )
        .route(
            "/v1/operations/{name}",
            get(|| async { Json(serde_json::json!({ "done": false })) }),
        );
    let base = serve(app).await;

    let stt = HttpSpeechToText::new(stt_config(base, Duration::from_millis(50)));
    assert_matches!(
        stt.transcribe("gs://audio/a.wav", "en").await,
        Err(SpeechError::Timeout(_))
    );
}

#[tokio::test]
async fn hung_submit_is_cut_off_at_the_deadline() {
    let app = Router::new().route(
        "/v1/speech:longrunningrecognize",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(serde_json::json!({ "name": "op-hung" }))
        }),
    );
    let base = serve(app).await;

    let stt = HttpSpeechToText::new(stt_config(base, Duration::from_millis(100)));
    let started = std::time::Instant::now();
    assert_matches!(
        stt.transcribe("gs://audio/a.wav", "en").await,
        Err(SpeechError::Timeout(_))
    );
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn transcribe_maps_rate_limit_to_quota() {
    let app = Router::new().route(
        "/v1/speech:longrunningrecognize",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let base = serve(app).await;

    let stt = HttpSpeechToText::new(stt_config(base, Duration::from_secs(1)));
    assert_matches!(
        stt.transcribe("gs://audio/a.wav", "en").await,
        Err(SpeechError::Quota { status: 429, .. })
    );
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    // Nothing listens on port 9 locally.
    let stt = HttpSpeechToText::new(stt_config(
        "http://127.0.0.1:9".to_string(),
        Duration::from_secs(1),
    ));
    assert_matches!(
        stt.transcribe("gs://audio/a.wav", "en").await,
        Err(SpeechError::Transport(_))
    );
}

// ---------------------------------------------------------------------------
// Text-to-speech
// ---------------------------------------------------------------------------

async fn synthesize(Path(voice_id): Path<String>, headers: HeaderMap) -> impl IntoResponse {
    if headers.get("xi-api-key").and_then(|v| v.to_str().ok()) != Some("tts-key") {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    if voice_id == "missing" {
        return (StatusCode::BAD_REQUEST, "voice not found").into_response();
    }
    ([(header::CONTENT_TYPE, "audio/mpeg")], vec![0xFFu8, 0xFB, 0x90]).into_response()
}

fn tts(api_url: String, api_key: &str) -> HttpTextToSpeech {
    HttpTextToSpeech::new(TtsConfig {
        api_url,
        api_key: Some(api_key.to_string()),
        model_id: "eleven_multilingual_v2".to_string(),
        timeout: Duration::from_secs(5),
    })
}

#[tokio::test]
async fn synthesize_returns_audio_bytes() {
    let base = serve(Router::new().route("/v1/text-to-speech/{voice_id}", post(synthesize))).await;

    let audio = tts(base, "tts-key")
        .synthesize("hola", "voice-1", "es")
        .await
        .unwrap();
    assert_eq!(audio.bytes, vec![0xFF, 0xFB, 0x90]);
    assert_eq!(audio.extension(), "mp3");
    assert!(audio.duration_ms.is_none());
}

#[tokio::test]
async fn synthesize_classifies_failures() {
    let base = serve(Router::new().route("/v1/text-to-speech/{voice_id}", post(synthesize))).await;

    assert_matches!(
        tts(base.clone(), "wrong").synthesize("hola", "voice-1", "es").await,
        Err(SpeechError::Auth { status: 401, .. })
    );
    let err = tts(base, "tts-key")
        .synthesize("hola", "missing", "es")
        .await
        .unwrap_err();
    assert_eq!(
        err.failure_kind(),
        voxdub_core::failure::FailureKind::ValidationError
    );
}
