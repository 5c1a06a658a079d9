//! Read-only queries for pollers.

use std::sync::Arc;

use serde::Serialize;
use voxdub_core::timeline::{validate_timing, TimingReport};
use voxdub_core::types::DbId;
use voxdub_core::voices::{Voice, VoiceCatalog};
use voxdub_db::models::dub::Dub;
use voxdub_db::models::job::Job;
use voxdub_db::models::transcript_segment::TranscriptSegment;
use voxdub_db::PipelineStore;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// A recording's transcript with its advisory timing diagnostics.
#[derive(Debug, Serialize)]
pub struct SegmentListing {
    pub segments: Vec<TranscriptSegment>,
    pub timing: TimingReport,
}

#[derive(Clone)]
pub struct StatusQuery {
    store: Arc<dyn PipelineStore>,
    voices: Arc<VoiceCatalog>,
    config: Arc<PipelineConfig>,
}

impl StatusQuery {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        voices: Arc<VoiceCatalog>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            store,
            voices,
            config,
        }
    }

    pub async fn get_job_status(&self, job_id: DbId) -> PipelineResult<Job> {
        self.store
            .find_job(job_id)
            .await?
            .ok_or(PipelineError::not_found("Job", job_id))
    }

    /// Dubs of a recording in creation order, optionally for one language.
    pub async fn get_dubs(
        &self,
        recording_id: DbId,
        language: Option<&str>,
    ) -> PipelineResult<Vec<Dub>> {
        Ok(self.store.list_dubs(recording_id, language).await?)
    }

    /// Voices for `language` (with fallback), or the whole catalog.
    pub fn list_voices(&self, language: Option<&str>) -> Vec<Voice> {
        match language {
            Some(language) => self.voices.voices_for(language).to_vec(),
            None => self.voices.all().cloned().collect(),
        }
    }

    pub async fn list_segments(&self, recording_id: DbId) -> PipelineResult<SegmentListing> {
        if self.store.find_recording(recording_id).await?.is_none() {
            return Err(PipelineError::not_found("Recording", recording_id));
        }
        let segments = self.store.list_segments(recording_id).await?;
        let timing = validate_timing(&segments, self.config.gap_threshold_ms);
        Ok(SegmentListing { segments, timing })
    }
}
