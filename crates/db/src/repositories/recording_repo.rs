//! Repository for the `recordings` table.

use sqlx::PgPool;
use voxdub_core::types::DbId;

use crate::models::recording::{CreateRecording, Recording};

const COLUMNS: &str = "id, title, audio_url, language_code, created_at, updated_at";

/// Provides CRUD operations for recordings.
pub struct RecordingRepo;

impl RecordingRepo {
    pub async fn create(pool: &PgPool, input: &CreateRecording) -> Result<Recording, sqlx::Error> {
        let query = format!(
            "INSERT INTO recordings (title, audio_url, language_code) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Recording>(&query)
            .bind(&input.title)
            .bind(&input.audio_url)
            .bind(&input.language_code)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Recording>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recordings WHERE id = $1");
        sqlx::query_as::<_, Recording>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
