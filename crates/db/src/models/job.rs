//! Job entity models and DTOs for the job ledger.

use serde::Serialize;
use sqlx::FromRow;
use voxdub_core::error::CoreError;
use voxdub_core::failure::JobFailure;
use voxdub_core::job::{JobStatus, JobType};
use voxdub_core::types::{DbId, StatusId, Timestamp};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub job_type: String,
    pub status_id: StatusId,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Job {
    pub fn status(&self) -> Result<JobStatus, CoreError> {
        JobStatus::from_id(self.status_id)
    }

    pub fn kind(&self) -> Result<JobType, CoreError> {
        JobType::parse(&self.job_type)
    }

    /// The classified failure recorded under `payload.error`, if any.
    pub fn failure(&self) -> Option<JobFailure> {
        JobFailure::from_payload(&self.payload)
    }
}

/// DTO for inserting a new job. Jobs always start `queued`.
#[derive(Debug, Clone)]
pub struct CreateJob {
    pub job_type: JobType,
    pub payload: serde_json::Value,
}

/// A transition already approved by the ledger, ready to persist.
#[derive(Debug, Clone)]
pub struct JobStatusUpdate {
    pub status: JobStatus,
    pub payload: serde_json::Value,
    /// Stamp `completed_at` with the current time.
    pub mark_completed: bool,
}
