pub mod events;
pub mod health;
pub mod jobs;
pub mod recordings;
pub mod voices;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /jobs/{id}                                        job status
///
/// /recordings/{id}/transcriptions                   queue transcription (POST)
/// /recordings/{id}/segments                         segments + timing report
/// /recordings/{id}/segments/{segment_id}/dubs       dub one segment (POST)
/// /recordings/{id}/dubs                             list dubs, dub every segment (POST)
///
/// /voices                                           voice catalog
/// /events                                           job transitions (SSE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/recordings", recordings::router())
        .merge(voices::router())
        .merge(events::router())
}
