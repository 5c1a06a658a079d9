//! Route definitions for the `/recordings` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::recordings;
use crate::state::AppState;

/// Routes mounted at `/recordings`.
///
/// ```text
/// POST   /{id}/transcriptions                  -> queue_transcription
/// GET    /{id}/segments                        -> list_segments
/// POST   /{id}/segments/{segment_id}/dubs      -> dub_segment
/// GET    /{id}/dubs                            -> list_dubs
/// POST   /{id}/dubs                            -> dub_recording
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/transcriptions", post(recordings::queue_transcription))
        .route("/{id}/segments", get(recordings::list_segments))
        .route(
            "/{id}/segments/{segment_id}/dubs",
            post(recordings::dub_segment),
        )
        .route(
            "/{id}/dubs",
            get(recordings::list_dubs).post(recordings::dub_recording),
        )
}
