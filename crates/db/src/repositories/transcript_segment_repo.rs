//! Repository for the `transcript_segments` table.

use sqlx::PgPool;
use voxdub_core::qc_status::QcStatus;
use voxdub_core::types::DbId;

use crate::models::transcript_segment::{NewTranscriptSegment, TranscriptSegment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, recording_id, segment_index, start_ms, end_ms, text_original, \
    confidence, qc_status_id, created_at, updated_at";

/// Provides read and bulk-replace operations for transcript segments.
pub struct TranscriptSegmentRepo;

impl TranscriptSegmentRepo {
    /// Find a segment by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TranscriptSegment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM transcript_segments WHERE id = $1");
        sqlx::query_as::<_, TranscriptSegment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all segments for a recording, ordered by `segment_index`.
    pub async fn list_by_recording(
        pool: &PgPool,
        recording_id: DbId,
    ) -> Result<Vec<TranscriptSegment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transcript_segments \
             WHERE recording_id = $1 \
             ORDER BY segment_index ASC"
        );
        sqlx::query_as::<_, TranscriptSegment>(&query)
            .bind(recording_id)
            .fetch_all(pool)
            .await
    }

    /// Discard every segment of a recording and insert `segments` in their
    /// place, inside one transaction.
    ///
    /// Readers see either the old set or the new set, never a mix.
    /// Translations of the discarded segments cascade away with them.
    pub async fn replace_for_recording(
        pool: &PgPool,
        recording_id: DbId,
        segments: &[NewTranscriptSegment],
    ) -> Result<Vec<TranscriptSegment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM transcript_segments WHERE recording_id = $1")
            .bind(recording_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO transcript_segments \
                (recording_id, segment_index, start_ms, end_ms, text_original, confidence, qc_status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );

        let mut inserted = Vec::with_capacity(segments.len());
        for segment in segments {
            let row = sqlx::query_as::<_, TranscriptSegment>(&query)
                .bind(recording_id)
                .bind(segment.segment_index)
                .bind(segment.start_ms)
                .bind(segment.end_ms)
                .bind(&segment.text_original)
                .bind(segment.confidence)
                .bind(QcStatus::Pending.id())
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
