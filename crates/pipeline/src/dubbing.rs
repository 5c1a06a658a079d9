//! Dubbing job producer.
//!
//! Each segment dub is one job. Before any synthesis the parameters are
//! hashed and looked up in the dub table; a hit completes the job without
//! touching the speech service or the artifact store. A fan-out over a whole
//! recording creates every job up front, then works through them in
//! `segment_index` order on a background task, pausing between synthesis
//! calls and carrying on past failed segments.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::task::JoinHandle;
use voxdub_core::estimation::estimate_duration_ms;
use voxdub_core::failure::{FailureKind, JobFailure};
use voxdub_core::hashing::dub_params_hash;
use voxdub_core::job::{JobStatus, JobType};
use voxdub_core::language::validate_language_code;
use voxdub_core::types::DbId;
use voxdub_core::voices::VoiceCatalog;
use voxdub_db::models::dub::CreateDub;
use voxdub_db::models::recording::Recording;
use voxdub_db::models::transcript_segment::TranscriptSegment;
use voxdub_db::PipelineStore;
use voxdub_speech::TextToSpeech;
use voxdub_storage::{dub_artifact_path, ArtifactStore};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::ledger::JobLedger;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Counts reported when a fan-out finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cache_hits: usize,
}

/// Result of [`DubbingProducer::dub_recording`].
#[derive(Debug)]
pub struct DubRecordingHandle {
    /// One job per segment, in `segment_index` order.
    pub job_ids: Vec<DbId>,
    /// The background task processing the jobs.
    pub task: JoinHandle<BatchSummary>,
}

/// What happened to one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentOutcome {
    Synthesized,
    CacheHit,
    Failed,
}

/// Everything shared by the segments of one request.
#[derive(Debug, Clone)]
struct DubTarget {
    recording_id: DbId,
    source_language: String,
    language: String,
    voice_id: String,
}

/// Spaces out synthesis calls within one batch.
struct Throttle {
    delay: Duration,
    calls: usize,
}

impl Throttle {
    fn new(delay: Duration) -> Self {
        Self { delay, calls: 0 }
    }

    /// Wait before a synthesis call; the first call of the batch goes
    /// straight through.
    async fn before_call(&mut self) {
        if self.calls > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.calls += 1;
    }
}

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct DubbingProducer {
    ledger: JobLedger,
    store: Arc<dyn PipelineStore>,
    tts: Arc<dyn TextToSpeech>,
    artifacts: Arc<dyn ArtifactStore>,
    voices: Arc<VoiceCatalog>,
    config: Arc<PipelineConfig>,
}

impl DubbingProducer {
    pub fn new(
        ledger: JobLedger,
        store: Arc<dyn PipelineStore>,
        tts: Arc<dyn TextToSpeech>,
        artifacts: Arc<dyn ArtifactStore>,
        voices: Arc<VoiceCatalog>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            ledger,
            store,
            tts,
            artifacts,
            voices,
            config,
        }
    }

    /// Dub a single segment, returning the job id once it is terminal.
    pub async fn dub_segment(
        &self,
        recording_id: DbId,
        segment_id: DbId,
        language: &str,
        voice_id: Option<&str>,
    ) -> PipelineResult<DbId> {
        let (recording, target) = self.prepare_target(recording_id, language, voice_id).await?;
        let segment = self
            .store
            .find_segment(segment_id)
            .await?
            .filter(|s| s.recording_id == recording.id)
            .ok_or_else(|| {
                PipelineError::validation(format!(
                    "Segment {segment_id} does not belong to recording {recording_id}"
                ))
            })?;

        let job = self.create_job(&target, &segment).await?;
        let mut throttle = Throttle::new(Duration::ZERO);
        self.process_segment(job.id, &segment, &target, &mut throttle)
            .await?;
        Ok(job.id)
    }

    /// Queue a dub of every segment of a recording.
    ///
    /// Jobs are created before this returns; processing happens on a
    /// spawned task whose handle is returned alongside the ids.
    pub async fn dub_recording(
        &self,
        recording_id: DbId,
        language: &str,
        voice_id: Option<&str>,
    ) -> PipelineResult<DubRecordingHandle> {
        let (_, target) = self.prepare_target(recording_id, language, voice_id).await?;
        let segments = self.store.list_segments(recording_id).await?;

        let mut batch = Vec::with_capacity(segments.len());
        for segment in segments {
            let job = self.create_job(&target, &segment).await?;
            batch.push((job.id, segment));
        }
        let job_ids = batch.iter().map(|(id, _)| *id).collect();

        tracing::info!(
            recording_id,
            language = %target.language,
            voice_id = %target.voice_id,
            jobs = batch.len(),
            "Dubbing batch queued"
        );

        let producer = self.clone();
        let task = tokio::spawn(async move { producer.run_batch(target, batch).await });
        Ok(DubRecordingHandle { job_ids, task })
    }

    // ---- private helpers ----

    async fn prepare_target(
        &self,
        recording_id: DbId,
        language: &str,
        voice_id: Option<&str>,
    ) -> PipelineResult<(Recording, DubTarget)> {
        validate_language_code(language)?;
        let voice_id = self.resolve_voice(language, voice_id)?;
        let recording = self
            .store
            .find_recording(recording_id)
            .await?
            .ok_or_else(|| {
                PipelineError::validation(format!("Recording {recording_id} does not exist"))
            })?;

        let target = DubTarget {
            recording_id,
            source_language: recording.language_code.clone(),
            language: language.to_string(),
            voice_id,
        };
        Ok((recording, target))
    }

    /// Explicit voice, else the first voice for the language (with
    /// fallback to the default-language set).
    fn resolve_voice(&self, language: &str, explicit: Option<&str>) -> PipelineResult<String> {
        match explicit {
            Some(voice) if voice.trim().is_empty() => {
                Err(PipelineError::validation("voice_id must not be empty"))
            }
            Some(voice) => Ok(voice.trim().to_string()),
            None => self
                .voices
                .default_voice(language)
                .map(|v| v.voice_id.clone())
                .ok_or_else(|| {
                    PipelineError::validation(format!("No voice configured for '{language}'"))
                }),
        }
    }

    async fn create_job(
        &self,
        target: &DubTarget,
        segment: &TranscriptSegment,
    ) -> PipelineResult<voxdub_db::models::job::Job> {
        self.ledger
            .create_job(
                JobType::Dubbing,
                json!({
                    "recording_id": target.recording_id,
                    "segment_id": segment.id,
                    "segment_index": segment.segment_index,
                    "language": target.language,
                    "voice_id": target.voice_id,
                }),
            )
            .await
    }

    async fn run_batch(
        self,
        target: DubTarget,
        batch: Vec<(DbId, TranscriptSegment)>,
    ) -> BatchSummary {
        let mut summary = BatchSummary {
            total: batch.len(),
            ..BatchSummary::default()
        };
        let mut throttle = Throttle::new(self.config.dub_throttle);

        for (job_id, segment) in &batch {
            match self
                .process_segment(*job_id, segment, &target, &mut throttle)
                .await
            {
                Ok(SegmentOutcome::Synthesized) => summary.completed += 1,
                Ok(SegmentOutcome::CacheHit) => {
                    summary.completed += 1;
                    summary.cache_hits += 1;
                }
                Ok(SegmentOutcome::Failed) => summary.failed += 1,
                Err(e) => {
                    tracing::error!(job_id, error = %e, "Failed to record dubbing job outcome");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            recording_id = target.recording_id,
            language = %target.language,
            total = summary.total,
            completed = summary.completed,
            failed = summary.failed,
            cache_hits = summary.cache_hits,
            "Dubbing batch finished"
        );
        summary
    }

    async fn process_segment(
        &self,
        job_id: DbId,
        segment: &TranscriptSegment,
        target: &DubTarget,
        throttle: &mut Throttle,
    ) -> PipelineResult<SegmentOutcome> {
        self.ledger
            .advance_job(job_id, JobStatus::Running, None)
            .await?;

        match self.dub(segment, target, throttle).await {
            Ok((result, cache_hit)) => {
                self.ledger.complete_job(job_id, result).await?;
                Ok(if cache_hit {
                    SegmentOutcome::CacheHit
                } else {
                    SegmentOutcome::Synthesized
                })
            }
            Err(failure) => {
                tracing::warn!(
                    job_id,
                    segment_id = segment.id,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Segment dub failed"
                );
                self.ledger.fail_job(job_id, failure).await?;
                Ok(SegmentOutcome::Failed)
            }
        }
    }

    /// Produce (or reuse) the dub for one segment. Returns the job result
    /// and whether it came from the cache.
    async fn dub(
        &self,
        segment: &TranscriptSegment,
        target: &DubTarget,
        throttle: &mut Throttle,
    ) -> Result<(serde_json::Value, bool), JobFailure> {
        let text = self.select_text(segment, target).await?;
        if text.trim().is_empty() {
            return Err(JobFailure::new(
                FailureKind::ValidationError,
                format!("Segment {} has no text to synthesize", segment.id),
            ));
        }

        let params_hash = dub_params_hash(&text, &target.voice_id, &target.language);
        let cached = self
            .store
            .find_dub_by_hash(&params_hash)
            .await
            .map_err(storage_failure)?;
        if let Some(dub) = cached {
            tracing::debug!(segment_id = segment.id, dub_id = dub.id, "Dub cache hit");
            return Ok((
                json!({ "dub_id": dub.id, "params_hash": params_hash, "cache_hit": true }),
                true,
            ));
        }

        throttle.before_call().await;
        let audio = self
            .tts
            .synthesize(&text, &target.voice_id, &target.language)
            .await
            .map_err(|e| JobFailure::new(e.failure_kind(), e.to_string()))?;

        let path = dub_artifact_path(&target.language, audio.extension());
        let stored = self
            .artifacts
            .put(&path, &audio.bytes, &audio.content_type)
            .await
            .map_err(|e| {
                JobFailure::new(FailureKind::StorageError, format!("Failed to store dub audio: {e}"))
            })?;

        let (duration_ms, duration_estimated) = match audio.duration_ms {
            Some(ms) => (ms, false),
            None => (estimate_duration_ms(&text, self.config.words_per_second), true),
        };

        let dub = self
            .store
            .insert_dub(&CreateDub {
                recording_id: target.recording_id,
                segment_id: Some(segment.id),
                language_code: target.language.clone(),
                voice_id: target.voice_id.clone(),
                audio_url: stored.url.clone(),
                duration_ms,
                params_hash: params_hash.clone(),
                is_synthetic: true,
            })
            .await
            .map_err(storage_failure)?;

        Ok((
            json!({
                "dub_id": dub.id,
                "params_hash": params_hash,
                "cache_hit": false,
                "audio_url": stored.url,
                "duration_ms": duration_ms,
                "duration_estimated": duration_estimated,
            }),
            false,
        ))
    }

    /// The translation for the target language, else the original text.
    async fn select_text(
        &self,
        segment: &TranscriptSegment,
        target: &DubTarget,
    ) -> Result<String, JobFailure> {
        let translation = self
            .store
            .find_translation(segment.id, &target.language)
            .await
            .map_err(storage_failure)?;

        match translation {
            Some(t) => Ok(t.translated_text),
            None => {
                if target.language != target.source_language {
                    tracing::info!(
                        segment_id = segment.id,
                        source_language = %target.source_language,
                        language = %target.language,
                        "No translation, dubbing original text"
                    );
                }
                Ok(segment.text_original.clone())
            }
        }
    }
}

fn storage_failure(err: voxdub_db::StoreError) -> JobFailure {
    JobFailure::new(FailureKind::StorageError, err.to_string())
}
