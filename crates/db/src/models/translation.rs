//! Translation model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use voxdub_core::types::{DbId, StatusId, Timestamp};

/// A row from the `translations` table. Unique on
/// `(segment_id, language_code)`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Translation {
    pub id: DbId,
    pub segment_id: DbId,
    pub language_code: String,
    pub translated_text: String,
    pub qc_status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting or replacing the translation of a segment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertTranslation {
    pub segment_id: DbId,
    pub language_code: String,
    pub translated_text: String,
}
