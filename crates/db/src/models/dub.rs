//! Dub (synthesized audio artifact) model and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use voxdub_core::types::{DbId, Timestamp};

/// A row from the `dubs` table. Rows are immutable.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dub {
    pub id: DbId,
    pub recording_id: DbId,
    /// `None` for a whole-recording dub.
    pub segment_id: Option<DbId>,
    pub language_code: String,
    pub voice_id: String,
    pub audio_url: String,
    pub duration_ms: i64,
    pub params_hash: String,
    pub is_synthetic: bool,
    pub created_at: Timestamp,
}

/// DTO for inserting a dub.
#[derive(Debug, Clone)]
pub struct CreateDub {
    pub recording_id: DbId,
    pub segment_id: Option<DbId>,
    pub language_code: String,
    pub voice_id: String,
    pub audio_url: String,
    pub duration_ms: i64,
    pub params_hash: String,
    pub is_synthetic: bool,
}
