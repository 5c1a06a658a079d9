//! Handlers for the `/jobs` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use voxdub_core::job::{JobStatus, JobType};
use voxdub_core::types::{DbId, Timestamp};
use voxdub_db::models::job::Job;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// A job as pollers see it: the status by name instead of its lookup id.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: DbId,
    pub job_type: JobType,
    pub status: JobStatus,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl TryFrom<Job> for JobResponse {
    type Error = voxdub_core::error::CoreError;

    fn try_from(job: Job) -> Result<Self, Self::Error> {
        Ok(Self {
            job_type: job.kind()?,
            status: job.status()?,
            id: job.id,
            payload: job.payload,
            created_at: job.created_at,
            updated_at: job.updated_at,
            completed_at: job.completed_at,
        })
    }
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = state.pipeline.status.get_job_status(job_id).await?;
    Ok(Json(DataResponse {
        data: JobResponse::try_from(job)?,
    }))
}
