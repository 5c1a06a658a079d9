use axum::routing::get;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// `GET /events`
pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(events::stream_events))
}
