//! Repository for the `jobs` table.
//!
//! Status values come from `JobStatus`; which transition is legal is
//! decided by the job ledger before anything reaches this repository.

use sqlx::PgPool;
use voxdub_core::job::JobStatus;
use voxdub_core::types::{DbId, Timestamp};

use crate::models::job::{CreateJob, Job, JobStatusUpdate};

/// Column list for `jobs` queries.
const COLUMNS: &str = "id, job_type, status_id, payload, created_at, updated_at, completed_at";

/// Provides CRUD operations for background jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new `queued` job, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateJob) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_type, status_id, payload) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(input.job_type.as_str())
            .bind(JobStatus::Queued.id())
            .bind(&input.payload)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Persist a status transition.
    ///
    /// The update only applies while the row is still in `expected`, so two
    /// writers racing on the same job cannot both win. Returns `None` when
    /// the row is missing or has moved on.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected: JobStatus,
        update: &JobStatusUpdate,
    ) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET status_id = $2, payload = $3, updated_at = NOW(), \
                 completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END \
             WHERE id = $1 AND status_id = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(update.status.id())
            .bind(&update.payload)
            .bind(update.mark_completed)
            .bind(expected.id())
            .fetch_optional(pool)
            .await
    }

    /// List `running` jobs whose last update is older than `cutoff`.
    pub async fn list_running_updated_before(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE status_id = $1 AND updated_at < $2 \
             ORDER BY updated_at ASC"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running.id())
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
