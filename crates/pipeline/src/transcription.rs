//! Transcription job producer.
//!
//! A request validates its input and creates a `queued` job; a spawned task
//! then drives the job to a terminal state: recognize the recording, clean up
//! the segments, replace the stored transcript in a single transaction and
//! attach advisory timing diagnostics.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;
use voxdub_core::failure::{FailureKind, JobFailure};
use voxdub_core::job::{JobStatus, JobType};
use voxdub_core::language::validate_language_code;
use voxdub_core::timeline::{
    merge_adjacent_segments, order_for_replace, sort_chronologically, validate_timing, SegmentSpan,
};
use voxdub_core::types::DbId;
use voxdub_db::models::recording::Recording;
use voxdub_db::models::transcript_segment::NewTranscriptSegment;
use voxdub_db::PipelineStore;
use voxdub_speech::{SpeechToText, Transcription};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::ledger::JobLedger;

/// Result of [`TranscriptionProducer::queue_transcription`].
#[derive(Debug)]
pub struct TranscriptionHandle {
    pub job_id: DbId,
    /// Resolves to the terminal status once the job is finished.
    pub task: JoinHandle<PipelineResult<JobStatus>>,
}

#[derive(Clone)]
pub struct TranscriptionProducer {
    ledger: JobLedger,
    store: Arc<dyn PipelineStore>,
    stt: Arc<dyn SpeechToText>,
    config: Arc<PipelineConfig>,
}

impl TranscriptionProducer {
    pub fn new(
        ledger: JobLedger,
        store: Arc<dyn PipelineStore>,
        stt: Arc<dyn SpeechToText>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            ledger,
            store,
            stt,
            config,
        }
    }

    /// Queue a transcription of a recording.
    ///
    /// The job exists when this returns; recognition runs on a spawned task.
    /// Only an invalid request or a ledger write failure is returned as an
    /// error; recognition and storage problems leave the job `failed`.
    pub async fn queue_transcription(
        &self,
        recording_id: DbId,
        language: Option<&str>,
    ) -> PipelineResult<TranscriptionHandle> {
        let language = language.unwrap_or(&self.config.default_language).to_string();
        validate_language_code(&language)?;
        let recording = self
            .store
            .find_recording(recording_id)
            .await?
            .ok_or_else(|| {
                PipelineError::validation(format!("Recording {recording_id} does not exist"))
            })?;

        let job = self
            .ledger
            .create_job(
                JobType::Transcription,
                json!({ "recording_id": recording_id, "language": language }),
            )
            .await?;

        let producer = self.clone();
        let job_id = job.id;
        let task = tokio::spawn(async move {
            let result = producer.drive(job_id, &recording, &language).await;
            if let Err(e) = &result {
                tracing::error!(job_id, error = %e, "Transcription job could not be finalized");
            }
            result
        });
        Ok(TranscriptionHandle { job_id, task })
    }

    /// Advance a queued job through `running` to a terminal state.
    async fn drive(
        &self,
        job_id: DbId,
        recording: &Recording,
        language: &str,
    ) -> PipelineResult<JobStatus> {
        self.ledger
            .advance_job(job_id, JobStatus::Running, None)
            .await?;

        match self.transcribe(recording, language).await {
            Ok(result) => {
                self.ledger.complete_job(job_id, result).await?;
                Ok(JobStatus::Completed)
            }
            Err(failure) => {
                tracing::warn!(
                    job_id,
                    recording_id = recording.id,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Transcription failed"
                );
                self.ledger.fail_job(job_id, failure).await?;
                Ok(JobStatus::Failed)
            }
        }
    }

    async fn transcribe(
        &self,
        recording: &Recording,
        language: &str,
    ) -> Result<serde_json::Value, JobFailure> {
        let transcription = self
            .stt
            .transcribe(&recording.audio_url, language)
            .await
            .map_err(|e| JobFailure::new(e.failure_kind(), e.to_string()))?;

        if transcription.segments.is_empty() {
            return Err(JobFailure::empty_transcription());
        }

        let rows = self.prepare_segments(recording.id, &transcription);
        if rows.is_empty() {
            return Err(JobFailure::new(
                FailureKind::EmptyResultError,
                "empty transcription: every recognized segment was blank, negative or zero-length",
            ));
        }

        let written = self
            .store
            .replace_segments(recording.id, &rows)
            .await
            .map_err(|e| {
                JobFailure::new(FailureKind::StorageError, format!("Failed to store segments: {e}"))
            })?;

        let timing = validate_timing(&written, self.config.gap_threshold_ms);
        if !timing.valid {
            tracing::warn!(
                recording_id = recording.id,
                issues = timing.issues.len(),
                overlaps = timing.overlap_count(),
                "Transcript timing issues"
            );
            for message in timing.messages() {
                tracing::debug!(recording_id = recording.id, "{message}");
            }
        }

        tracing::info!(
            recording_id = recording.id,
            segment_count = written.len(),
            "Transcript replaced"
        );
        Ok(json!({
            "segment_count": written.len(),
            "transcript_language": transcription.language,
            "confidence": transcription.confidence,
            "timing_valid": timing.valid,
            "timing_issues": timing.issues,
        }))
    }

    /// Drop unusable segments, sort, optionally fold duplicates, then index
    /// what remains.
    fn prepare_segments(
        &self,
        recording_id: DbId,
        transcription: &Transcription,
    ) -> Vec<NewTranscriptSegment> {
        let mut confidences: HashMap<(i64, String), Option<f64>> = HashMap::new();
        let mut spans = Vec::with_capacity(transcription.segments.len());

        for segment in &transcription.segments {
            let text = segment.text.trim();
            if text.is_empty() || segment.start_ms < 0 || segment.end_ms <= segment.start_ms {
                tracing::debug!(
                    recording_id,
                    start_ms = segment.start_ms,
                    end_ms = segment.end_ms,
                    "Dropping blank, negative or zero-length segment"
                );
                continue;
            }
            confidences
                .entry((segment.start_ms, text.to_string()))
                .or_insert(segment.confidence);
            spans.push(SegmentSpan::new(segment.start_ms, segment.end_ms, text));
        }

        sort_chronologically(&mut spans);
        if self.config.merge_duplicate_segments {
            let before = spans.len();
            spans = merge_adjacent_segments(&spans);
            if spans.len() < before {
                tracing::debug!(recording_id, merged = before - spans.len(), "Merged duplicate segments");
            }
        }

        order_for_replace(spans)
            .into_iter()
            .map(|(segment_index, span)| NewTranscriptSegment {
                segment_index,
                confidence: confidences
                    .get(&(span.start_ms, span.text.clone()))
                    .copied()
                    .flatten(),
                start_ms: span.start_ms,
                end_ms: span.end_ms,
                text_original: span.text,
            })
            .collect()
    }
}
