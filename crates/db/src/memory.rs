//! In-process implementation of the store traits.
//!
//! Mirrors the PostgreSQL schema's behaviour where the pipeline relies on
//! it: ids are assigned from one increasing sequence, a segment replace is
//! atomic under a single write lock, translations cascade with their
//! segment, and dubs lose their `segment_id` instead of being deleted.
//! Used by tests and by the API when no `DATABASE_URL` is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use voxdub_core::job::JobStatus;
use voxdub_core::qc_status::QcStatus;
use voxdub_core::types::{DbId, Timestamp};

use crate::models::dub::{CreateDub, Dub};
use crate::models::job::{CreateJob, Job, JobStatusUpdate};
use crate::models::recording::{CreateRecording, Recording};
use crate::models::transcript_segment::{NewTranscriptSegment, TranscriptSegment};
use crate::models::translation::{Translation, UpsertTranslation};
use crate::store::{
    DubStore, JobStore, RecordingStore, StoreError, StoreResult, TranscriptStore,
};

#[derive(Default)]
struct Tables {
    last_id: DbId,
    jobs: BTreeMap<DbId, Job>,
    recordings: BTreeMap<DbId, Recording>,
    segments: BTreeMap<DbId, TranscriptSegment>,
    translations: BTreeMap<DbId, Translation>,
    dubs: BTreeMap<DbId, Dub>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn require_recording(&self, id: DbId) -> StoreResult<()> {
        if self.recordings.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::NotFound {
                entity: "Recording",
                id,
            })
        }
    }
}

/// Store keeping every table in memory behind one `RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a job's `updated_at`, e.g. to simulate a job that stopped
    /// reporting long ago.
    pub async fn set_job_updated_at(&self, id: DbId, updated_at: Timestamp) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let job = tables
            .jobs
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Job", id })?;
        job.updated_at = updated_at;
        Ok(())
    }

    /// Number of stored dubs across all recordings.
    pub async fn dub_count(&self) -> usize {
        self.tables.read().await.dubs.len()
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert_job(&self, input: &CreateJob) -> StoreResult<Job> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let job = Job {
            id: tables.next_id(),
            job_type: input.job_type.as_str().to_string(),
            status_id: JobStatus::Queued.id(),
            payload: input.payload.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        tables.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: DbId) -> StoreResult<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(&id).cloned())
    }

    async fn update_job_status(
        &self,
        id: DbId,
        expected: JobStatus,
        update: &JobStatusUpdate,
    ) -> StoreResult<Option<Job>> {
        let mut tables = self.tables.write().await;
        let Some(job) = tables.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job.status_id != expected.id() {
            return Ok(None);
        }

        let now = Utc::now();
        job.status_id = update.status.id();
        job.payload = update.payload.clone();
        job.updated_at = now;
        if update.mark_completed {
            job.completed_at = Some(now);
        }
        Ok(Some(job.clone()))
    }

    async fn list_running_updated_before(&self, cutoff: Timestamp) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        let mut stale: Vec<Job> = tables
            .jobs
            .values()
            .filter(|j| j.status_id == JobStatus::Running.id() && j.updated_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by_key(|j| j.updated_at);
        Ok(stale)
    }
}

#[async_trait]
impl RecordingStore for InMemoryStore {
    async fn insert_recording(&self, input: &CreateRecording) -> StoreResult<Recording> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let recording = Recording {
            id: tables.next_id(),
            title: input.title.clone(),
            audio_url: input.audio_url.clone(),
            language_code: input.language_code.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.recordings.insert(recording.id, recording.clone());
        Ok(recording)
    }

    async fn find_recording(&self, id: DbId) -> StoreResult<Option<Recording>> {
        Ok(self.tables.read().await.recordings.get(&id).cloned())
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStore {
    async fn list_segments(&self, recording_id: DbId) -> StoreResult<Vec<TranscriptSegment>> {
        let tables = self.tables.read().await;
        let mut segments: Vec<TranscriptSegment> = tables
            .segments
            .values()
            .filter(|s| s.recording_id == recording_id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.segment_index);
        Ok(segments)
    }

    async fn find_segment(&self, id: DbId) -> StoreResult<Option<TranscriptSegment>> {
        Ok(self.tables.read().await.segments.get(&id).cloned())
    }

    async fn replace_segments(
        &self,
        recording_id: DbId,
        segments: &[NewTranscriptSegment],
    ) -> StoreResult<Vec<TranscriptSegment>> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.segment_index < 0 || s.start_ms < 0 || s.end_ms <= s.start_ms)
        {
            return Err(StoreError::CheckViolation(format!(
                "segment {} has invalid bounds {}..{}",
                bad.segment_index, bad.start_ms, bad.end_ms
            )));
        }

        let mut tables = self.tables.write().await;
        tables.require_recording(recording_id)?;

        let removed: Vec<DbId> = tables
            .segments
            .values()
            .filter(|s| s.recording_id == recording_id)
            .map(|s| s.id)
            .collect();
        for id in &removed {
            tables.segments.remove(id);
        }
        tables.translations.retain(|_, t| !removed.contains(&t.segment_id));
        for dub in tables.dubs.values_mut() {
            if dub.segment_id.is_some_and(|id| removed.contains(&id)) {
                dub.segment_id = None;
            }
        }

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(segments.len());
        for segment in segments {
            let row = TranscriptSegment {
                id: tables.next_id(),
                recording_id,
                segment_index: segment.segment_index,
                start_ms: segment.start_ms,
                end_ms: segment.end_ms,
                text_original: segment.text_original.clone(),
                confidence: segment.confidence,
                qc_status_id: QcStatus::Pending.id(),
                created_at: now,
                updated_at: now,
            };
            tables.segments.insert(row.id, row.clone());
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn find_translation(
        &self,
        segment_id: DbId,
        language_code: &str,
    ) -> StoreResult<Option<Translation>> {
        let tables = self.tables.read().await;
        Ok(tables
            .translations
            .values()
            .find(|t| t.segment_id == segment_id && t.language_code == language_code)
            .cloned())
    }

    async fn upsert_translation(&self, input: &UpsertTranslation) -> StoreResult<Translation> {
        let mut tables = self.tables.write().await;
        if !tables.segments.contains_key(&input.segment_id) {
            return Err(StoreError::NotFound {
                entity: "TranscriptSegment",
                id: input.segment_id,
            });
        }

        let now = Utc::now();
        let existing = tables
            .translations
            .values_mut()
            .find(|t| t.segment_id == input.segment_id && t.language_code == input.language_code);
        if let Some(translation) = existing {
            translation.translated_text = input.translated_text.clone();
            translation.qc_status_id = QcStatus::Pending.id();
            translation.updated_at = now;
            return Ok(translation.clone());
        }

        let translation = Translation {
            id: tables.next_id(),
            segment_id: input.segment_id,
            language_code: input.language_code.clone(),
            translated_text: input.translated_text.clone(),
            qc_status_id: QcStatus::Pending.id(),
            created_at: now,
            updated_at: now,
        };
        tables.translations.insert(translation.id, translation.clone());
        Ok(translation)
    }
}

#[async_trait]
impl DubStore for InMemoryStore {
    async fn find_dub_by_hash(&self, params_hash: &str) -> StoreResult<Option<Dub>> {
        let tables = self.tables.read().await;
        Ok(tables
            .dubs
            .values()
            .find(|d| d.params_hash == params_hash)
            .cloned())
    }

    async fn insert_dub(&self, input: &CreateDub) -> StoreResult<Dub> {
        let mut tables = self.tables.write().await;
        tables.require_recording(input.recording_id)?;

        let dub = Dub {
            id: tables.next_id(),
            recording_id: input.recording_id,
            segment_id: input.segment_id,
            language_code: input.language_code.clone(),
            voice_id: input.voice_id.clone(),
            audio_url: input.audio_url.clone(),
            duration_ms: input.duration_ms,
            params_hash: input.params_hash.clone(),
            is_synthetic: input.is_synthetic,
            created_at: Utc::now(),
        };
        tables.dubs.insert(dub.id, dub.clone());
        Ok(dub)
    }

    async fn list_dubs(
        &self,
        recording_id: DbId,
        language_code: Option<&str>,
    ) -> StoreResult<Vec<Dub>> {
        let tables = self.tables.read().await;
        Ok(tables
            .dubs
            .values()
            .filter(|d| d.recording_id == recording_id)
            .filter(|d| language_code.map_or(true, |lang| d.language_code == lang))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
