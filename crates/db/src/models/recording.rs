//! Recording entity model.
//!
//! Recordings are created by the catalog layer; the pipeline only reads
//! them to find the audio reference and source language.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use voxdub_core::types::{DbId, Timestamp};

/// A row from the `recordings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recording {
    pub id: DbId,
    pub title: String,
    pub audio_url: String,
    pub language_code: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a recording.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecording {
    pub title: String,
    pub audio_url: String,
    pub language_code: String,
}
