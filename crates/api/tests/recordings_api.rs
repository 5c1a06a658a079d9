//! Transcription and dubbing endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with, get, post_json, test_config, wait_for_terminal,
};
use serde_json::json;
use voxdub_api::config::ServerConfig;
use voxdub_speech::RecognizedSegment;

fn segment(start_ms: i64, end_ms: i64, text: &str) -> RecognizedSegment {
    RecognizedSegment {
        text: text.to_string(),
        start_ms,
        end_ms,
        confidence: Some(0.95),
    }
}

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transcription_returns_created_job() {
    let app = build_test_app();
    let recording_id = app.recording().await;
    *app.stt.segments.lock().unwrap() = vec![segment(0, 1_000, "hello"), segment(1_100, 2_000, "there")];

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/recordings/{recording_id}/transcriptions"),
        json!({ "language": "en" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job_id = body_json(response).await["data"]["job_id"].as_i64().unwrap();

    let job = wait_for_terminal(&app.router, job_id).await;
    assert_eq!(job["data"]["status"], "completed");
    assert_eq!(job["data"]["job_type"], "transcription");
    assert_eq!(job["data"]["payload"]["result"]["segment_count"], 2);

    let listing = body_json(
        get(app.router, &format!("/api/v1/recordings/{recording_id}/segments")).await,
    )
    .await;
    assert_eq!(listing["data"]["segments"].as_array().unwrap().len(), 2);
    assert_eq!(listing["data"]["timing"]["valid"], true);
}

#[tokio::test]
async fn empty_transcription_is_a_failed_job_not_an_error() {
    let app = build_test_app();
    let recording_id = app.recording().await;

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/recordings/{recording_id}/transcriptions"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job_id = body_json(response).await["data"]["job_id"].as_i64().unwrap();

    let job = wait_for_terminal(&app.router, job_id).await;
    assert_eq!(job["data"]["status"], "failed");
    assert_eq!(job["data"]["payload"]["error"]["kind"], "EmptyResultError");
}

#[tokio::test]
async fn slow_recognition_outlives_the_request_timeout() {
    let app = build_test_app_with(ServerConfig {
        request_timeout_secs: 1,
        ..test_config()
    });
    let recording_id = app.recording().await;
    *app.stt.segments.lock().unwrap() = vec![segment(0, 1_000, "eventually")];
    *app.stt.delay.lock().unwrap() = Some(Duration::from_secs(2));

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/recordings/{recording_id}/transcriptions"),
        json!({ "language": "en" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let job_id = body_json(response).await["data"]["job_id"].as_i64().unwrap();

    let queued = body_json(get(app.router.clone(), &format!("/api/v1/jobs/{job_id}")).await).await;
    assert_ne!(queued["data"]["status"], "completed");

    let job = wait_for_terminal(&app.router, job_id).await;
    assert_eq!(job["data"]["status"], "completed");
    assert_eq!(job["data"]["payload"]["result"]["segment_count"], 1);
}

#[tokio::test]
async fn transcription_of_unknown_recording_is_400() {
    let app = build_test_app();
    let response = post_json(
        app.router,
        "/api/v1/recordings/404/transcriptions",
        json!({ "language": "en" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn too_short_language_fails_body_validation() {
    let app = build_test_app();
    let recording_id = app.recording().await;

    let response = post_json(
        app.router,
        &format!("/api/v1/recordings/{recording_id}/transcriptions"),
        json!({ "language": "e" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn segments_of_unknown_recording_is_404() {
    let app = build_test_app();
    let response = get(app.router, "/api/v1/recordings/31/segments").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Dubbing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dub_segment_then_list_dubs() {
    let app = build_test_app();
    let recording_id = app.recording().await;
    let segment_ids = app.seed_segments(recording_id, &["good evening"]).await;

    let response = post_json(
        app.router.clone(),
        &format!(
            "/api/v1/recordings/{recording_id}/segments/{}/dubs",
            segment_ids[0]
        ),
        json!({ "language": "fr" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let dubs = body_json(
        get(
            app.router,
            &format!("/api/v1/recordings/{recording_id}/dubs?language=fr"),
        )
        .await,
    )
    .await;
    let dubs = dubs["data"].as_array().unwrap();
    assert_eq!(dubs.len(), 1);
    assert_eq!(dubs[0]["language_code"], "fr");
    assert_eq!(dubs[0]["is_synthetic"], true);
    assert!(dubs[0]["audio_url"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:3000/media/dubs/fr/"));
}

#[tokio::test]
async fn dub_segment_with_blank_voice_is_400() {
    let app = build_test_app();
    let recording_id = app.recording().await;
    let segment_ids = app.seed_segments(recording_id, &["text"]).await;

    let response = post_json(
        app.router,
        &format!(
            "/api/v1/recordings/{recording_id}/segments/{}/dubs",
            segment_ids[0]
        ),
        json!({ "language": "en", "voice_id": "" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(*app.tts.calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn dub_recording_accepts_and_returns_every_job() {
    let app = build_test_app();
    let recording_id = app.recording().await;
    app.seed_segments(recording_id, &["first", "!second", "third"])
        .await;

    let response = post_json(
        app.router.clone(),
        &format!("/api/v1/recordings/{recording_id}/dubs"),
        json!({ "language": "en" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let job_ids: Vec<i64> = body_json(response).await["data"]["job_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    assert_eq!(job_ids.len(), 3);

    // Poll until the background batch is done.
    let mut statuses = Vec::new();
    for _ in 0..200 {
        statuses.clear();
        for id in &job_ids {
            let job = body_json(get(app.router.clone(), &format!("/api/v1/jobs/{id}")).await).await;
            statuses.push(job["data"]["status"].as_str().unwrap().to_string());
        }
        if statuses.iter().all(|s| s == "completed" || s == "failed") {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(statuses, ["completed", "failed", "completed"]);

    let failed = body_json(get(app.router.clone(), &format!("/api/v1/jobs/{}", job_ids[1])).await).await;
    assert_eq!(failed["data"]["payload"]["error"]["kind"], "QuotaError");

    let dubs = body_json(get(app.router, &format!("/api/v1/recordings/{recording_id}/dubs")).await).await;
    assert_eq!(dubs["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn dub_recording_with_bad_language_is_400() {
    let app = build_test_app();
    let recording_id = app.recording().await;

    let response = post_json(
        app.router,
        &format!("/api/v1/recordings/{recording_id}/dubs"),
        json!({ "language": "not a language" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
