//! Store traits consumed by the pipeline.
//!
//! The pipeline never talks to a pool directly; it holds an
//! `Arc<dyn PipelineStore>`. [`PgStore`] backs the traits with the
//! repositories in this crate, and
//! [`InMemoryStore`](crate::memory::InMemoryStore) backs them with maps.

use async_trait::async_trait;
use voxdub_core::error::CoreError;
use voxdub_core::job::JobStatus;
use voxdub_core::types::{DbId, Timestamp};

use crate::models::dub::{CreateDub, Dub};
use crate::models::job::{CreateJob, Job, JobStatusUpdate};
use crate::models::recording::{CreateRecording, Recording};
use crate::models::transcript_segment::{NewTranscriptSegment, TranscriptSegment};
use crate::models::translation::{Translation, UpsertTranslation};
use crate::repositories::{DubRepo, JobRepo, RecordingRepo, TranscriptSegmentRepo, TranslationRepo};
use crate::DbPool;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from any store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A referenced row does not exist.
    #[error("Row not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A uniqueness or foreign-key rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A row breaks a column check of the schema.
    #[error("Check violation: {0}")]
    CheckViolation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            StoreError::CheckViolation(msg) => CoreError::Internal(format!("Check violation: {msg}")),
            StoreError::Database(e) => CoreError::Internal(format!("Database error: {e}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Persistence of the job ledger.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a `queued` job.
    async fn insert_job(&self, input: &CreateJob) -> StoreResult<Job>;

    async fn find_job(&self, id: DbId) -> StoreResult<Option<Job>>;

    /// Persist a transition if the job is still in `expected`.
    ///
    /// Returns `None` when the job is missing or its status has changed.
    async fn update_job_status(
        &self,
        id: DbId,
        expected: JobStatus,
        update: &JobStatusUpdate,
    ) -> StoreResult<Option<Job>>;

    /// `running` jobs last updated before `cutoff`, oldest first.
    async fn list_running_updated_before(&self, cutoff: Timestamp) -> StoreResult<Vec<Job>>;
}

/// Read access to recordings (plus creation for seeding and tests).
#[async_trait]
pub trait RecordingStore: Send + Sync {
    async fn insert_recording(&self, input: &CreateRecording) -> StoreResult<Recording>;

    async fn find_recording(&self, id: DbId) -> StoreResult<Option<Recording>>;
}

/// Transcript segments and their translations.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Segments of a recording ordered by `segment_index`.
    async fn list_segments(&self, recording_id: DbId) -> StoreResult<Vec<TranscriptSegment>>;

    async fn find_segment(&self, id: DbId) -> StoreResult<Option<TranscriptSegment>>;

    /// Atomically replace every segment of a recording.
    async fn replace_segments(
        &self,
        recording_id: DbId,
        segments: &[NewTranscriptSegment],
    ) -> StoreResult<Vec<TranscriptSegment>>;

    async fn find_translation(
        &self,
        segment_id: DbId,
        language_code: &str,
    ) -> StoreResult<Option<Translation>>;

    async fn upsert_translation(&self, input: &UpsertTranslation) -> StoreResult<Translation>;
}

/// The dub table, which doubles as the synthesis cache index.
#[async_trait]
pub trait DubStore: Send + Sync {
    async fn find_dub_by_hash(&self, params_hash: &str) -> StoreResult<Option<Dub>>;

    async fn insert_dub(&self, input: &CreateDub) -> StoreResult<Dub>;

    async fn list_dubs(
        &self,
        recording_id: DbId,
        language_code: Option<&str>,
    ) -> StoreResult<Vec<Dub>>;
}

/// Everything the pipeline needs from persistence.
pub trait PipelineStore: JobStore + RecordingStore + TranscriptStore + DubStore {}

impl<T> PipelineStore for T where T: JobStore + RecordingStore + TranscriptStore + DubStore {}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

/// Store backed by PostgreSQL through the repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Translate constraint violations into [`StoreError::Conflict`] or
/// [`StoreError::CheckViolation`].
///
/// PostgreSQL codes: 23505 unique violation, 23503 foreign-key violation,
/// 23514 check violation.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23514") {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::CheckViolation(format!("Constraint violated: {constraint}"));
        }
        if matches!(db_err.code().as_deref(), Some("23505") | Some("23503")) {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::Conflict(format!("Constraint violated: {constraint}"));
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, input: &CreateJob) -> StoreResult<Job> {
        JobRepo::create(&self.pool, input).await.map_err(classify)
    }

    async fn find_job(&self, id: DbId) -> StoreResult<Option<Job>> {
        Ok(JobRepo::find_by_id(&self.pool, id).await?)
    }

    async fn update_job_status(
        &self,
        id: DbId,
        expected: JobStatus,
        update: &JobStatusUpdate,
    ) -> StoreResult<Option<Job>> {
        Ok(JobRepo::update_status(&self.pool, id, expected, update).await?)
    }

    async fn list_running_updated_before(&self, cutoff: Timestamp) -> StoreResult<Vec<Job>> {
        Ok(JobRepo::list_running_updated_before(&self.pool, cutoff).await?)
    }
}

#[async_trait]
impl RecordingStore for PgStore {
    async fn insert_recording(&self, input: &CreateRecording) -> StoreResult<Recording> {
        RecordingRepo::create(&self.pool, input)
            .await
            .map_err(classify)
    }

    async fn find_recording(&self, id: DbId) -> StoreResult<Option<Recording>> {
        Ok(RecordingRepo::find_by_id(&self.pool, id).await?)
    }
}

#[async_trait]
impl TranscriptStore for PgStore {
    async fn list_segments(&self, recording_id: DbId) -> StoreResult<Vec<TranscriptSegment>> {
        Ok(TranscriptSegmentRepo::list_by_recording(&self.pool, recording_id).await?)
    }

    async fn find_segment(&self, id: DbId) -> StoreResult<Option<TranscriptSegment>> {
        Ok(TranscriptSegmentRepo::find_by_id(&self.pool, id).await?)
    }

    async fn replace_segments(
        &self,
        recording_id: DbId,
        segments: &[NewTranscriptSegment],
    ) -> StoreResult<Vec<TranscriptSegment>> {
        TranscriptSegmentRepo::replace_for_recording(&self.pool, recording_id, segments)
            .await
            .map_err(classify)
    }

    async fn find_translation(
        &self,
        segment_id: DbId,
        language_code: &str,
    ) -> StoreResult<Option<Translation>> {
        Ok(TranslationRepo::find_for_segment(&self.pool, segment_id, language_code).await?)
    }

    async fn upsert_translation(&self, input: &UpsertTranslation) -> StoreResult<Translation> {
        TranslationRepo::upsert(&self.pool, input)
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl DubStore for PgStore {
    async fn find_dub_by_hash(&self, params_hash: &str) -> StoreResult<Option<Dub>> {
        Ok(DubRepo::find_by_params_hash(&self.pool, params_hash).await?)
    }

    async fn insert_dub(&self, input: &CreateDub) -> StoreResult<Dub> {
        DubRepo::create(&self.pool, input).await.map_err(classify)
    }

    async fn list_dubs(
        &self,
        recording_id: DbId,
        language_code: Option<&str>,
    ) -> StoreResult<Vec<Dub>> {
        Ok(DubRepo::list_by_recording(&self.pool, recording_id, language_code).await?)
    }
}
