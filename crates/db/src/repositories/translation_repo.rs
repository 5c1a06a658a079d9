//! Repository for the `translations` table.

use sqlx::PgPool;
use voxdub_core::qc_status::QcStatus;
use voxdub_core::types::DbId;

use crate::models::translation::{Translation, UpsertTranslation};

const COLUMNS: &str =
    "id, segment_id, language_code, translated_text, qc_status_id, created_at, updated_at";

/// Provides lookup and upsert for segment translations.
pub struct TranslationRepo;

impl TranslationRepo {
    /// Find the translation of a segment into `language_code`.
    pub async fn find_for_segment(
        pool: &PgPool,
        segment_id: DbId,
        language_code: &str,
    ) -> Result<Option<Translation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM translations \
             WHERE segment_id = $1 AND language_code = $2"
        );
        sqlx::query_as::<_, Translation>(&query)
            .bind(segment_id)
            .bind(language_code)
            .fetch_optional(pool)
            .await
    }

    /// Insert a translation, or replace the text of the existing one for
    /// the same `(segment_id, language_code)`. A replaced text goes back to
    /// pending review.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertTranslation,
    ) -> Result<Translation, sqlx::Error> {
        let query = format!(
            "INSERT INTO translations (segment_id, language_code, translated_text, qc_status_id) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (segment_id, language_code) DO UPDATE \
             SET translated_text = EXCLUDED.translated_text, \
                 qc_status_id = EXCLUDED.qc_status_id, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Translation>(&query)
            .bind(input.segment_id)
            .bind(&input.language_code)
            .bind(&input.translated_text)
            .bind(QcStatus::Pending.id())
            .fetch_one(pool)
            .await
    }
}
