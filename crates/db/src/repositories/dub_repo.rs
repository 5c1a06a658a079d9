//! Repository for the `dubs` table.
//!
//! `params_hash` is indexed but not unique: concurrent cache misses for the
//! same inputs may each insert a row, and such rows are interchangeable.

use sqlx::PgPool;
use voxdub_core::types::DbId;

use crate::models::dub::{CreateDub, Dub};

const COLUMNS: &str = "id, recording_id, segment_id, language_code, voice_id, audio_url, \
    duration_ms, params_hash, is_synthetic, created_at";

/// Provides insert and lookup operations for dubs.
pub struct DubRepo;

impl DubRepo {
    pub async fn create(pool: &PgPool, input: &CreateDub) -> Result<Dub, sqlx::Error> {
        let query = format!(
            "INSERT INTO dubs \
                (recording_id, segment_id, language_code, voice_id, audio_url, \
                 duration_ms, params_hash, is_synthetic) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dub>(&query)
            .bind(input.recording_id)
            .bind(input.segment_id)
            .bind(&input.language_code)
            .bind(&input.voice_id)
            .bind(&input.audio_url)
            .bind(input.duration_ms)
            .bind(&input.params_hash)
            .bind(input.is_synthetic)
            .fetch_one(pool)
            .await
    }

    /// Oldest dub produced from the given parameters, if any.
    pub async fn find_by_params_hash(
        pool: &PgPool,
        params_hash: &str,
    ) -> Result<Option<Dub>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dubs \
             WHERE params_hash = $1 \
             ORDER BY id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Dub>(&query)
            .bind(params_hash)
            .fetch_optional(pool)
            .await
    }

    /// List dubs of a recording, optionally filtered by language, in
    /// creation order.
    pub async fn list_by_recording(
        pool: &PgPool,
        recording_id: DbId,
        language_code: Option<&str>,
    ) -> Result<Vec<Dub>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dubs \
             WHERE recording_id = $1 AND ($2::TEXT IS NULL OR language_code = $2) \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Dub>(&query)
            .bind(recording_id)
            .bind(language_code)
            .fetch_all(pool)
            .await
    }
}
