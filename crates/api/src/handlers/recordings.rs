//! Handlers for transcription and dubbing under `/recordings/{id}`.
//!
//! Transcription and whole-recording dubs answer as soon as their jobs exist;
//! single-segment dubbing answers once its job is terminal.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use voxdub_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /recordings/{id}/transcriptions`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TranscriptionRequest {
    /// Defaults to the configured pipeline language.
    #[serde(default)]
    #[validate(length(min = 2, max = 35))]
    pub language: Option<String>,
}

/// Body of both dub endpoints.
#[derive(Debug, Deserialize, Validate)]
pub struct DubRequest {
    #[validate(length(min = 2, max = 35))]
    pub language: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub voice_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DubListQuery {
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobCreated {
    pub job_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct JobsQueued {
    pub job_ids: Vec<DbId>,
}

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

/// POST /api/v1/recordings/{id}/transcriptions
///
/// Returns 201 with the job id as soon as the job is queued; recognition
/// runs in the background and its outcome is read from the job.
pub async fn queue_transcription(
    State(state): State<AppState>,
    Path(recording_id): Path<DbId>,
    Json(input): Json<TranscriptionRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let handle = state
        .pipeline
        .transcription
        .queue_transcription(recording_id, input.language.as_deref())
        .await?;

    tracing::info!(job_id = handle.job_id, recording_id, "Transcription job queued");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: JobCreated {
                job_id: handle.job_id,
            },
        }),
    ))
}

/// GET /api/v1/recordings/{id}/segments
pub async fn list_segments(
    State(state): State<AppState>,
    Path(recording_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let listing = state.pipeline.status.list_segments(recording_id).await?;
    Ok(Json(DataResponse { data: listing }))
}

// ---------------------------------------------------------------------------
// Dubbing
// ---------------------------------------------------------------------------

/// POST /api/v1/recordings/{id}/segments/{segment_id}/dubs
pub async fn dub_segment(
    State(state): State<AppState>,
    Path((recording_id, segment_id)): Path<(DbId, DbId)>,
    Json(input): Json<DubRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let job_id = state
        .pipeline
        .dubbing
        .dub_segment(
            recording_id,
            segment_id,
            &input.language,
            input.voice_id.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: JobCreated { job_id },
        }),
    ))
}

/// POST /api/v1/recordings/{id}/dubs
///
/// Returns 202 with one job id per segment; the jobs are processed in the
/// background and must be polled individually.
pub async fn dub_recording(
    State(state): State<AppState>,
    Path(recording_id): Path<DbId>,
    Json(input): Json<DubRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let handle = state
        .pipeline
        .dubbing
        .dub_recording(recording_id, &input.language, input.voice_id.as_deref())
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: JobsQueued {
                job_ids: handle.job_ids,
            },
        }),
    ))
}

/// GET /api/v1/recordings/{id}/dubs?language=
pub async fn list_dubs(
    State(state): State<AppState>,
    Path(recording_id): Path<DbId>,
    Query(params): Query<DubListQuery>,
) -> AppResult<impl IntoResponse> {
    let dubs = state
        .pipeline
        .status
        .get_dubs(recording_id, params.language.as_deref())
        .await?;
    Ok(Json(DataResponse { data: dubs }))
}
