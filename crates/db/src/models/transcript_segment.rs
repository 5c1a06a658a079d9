//! Transcript segment model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use voxdub_core::timeline::TimedText;
use voxdub_core::types::{DbId, StatusId, Timestamp};

/// A row from the `transcript_segments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TranscriptSegment {
    pub id: DbId,
    pub recording_id: DbId,
    pub segment_index: i32,
    pub start_ms: i64,
    pub end_ms: i64,
    pub text_original: String,
    pub confidence: Option<f64>,
    pub qc_status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TimedText for TranscriptSegment {
    fn start_ms(&self) -> i64 {
        self.start_ms
    }

    fn end_ms(&self) -> i64 {
        self.end_ms
    }

    fn text(&self) -> &str {
        &self.text_original
    }
}

/// One segment of a bulk replace. `qc_status_id` starts at pending.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTranscriptSegment {
    pub segment_index: i32,
    pub start_ms: i64,
    pub end_ms: i64,
    pub text_original: String,
    pub confidence: Option<f64>,
}
