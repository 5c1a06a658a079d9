use axum::routing::get;
use axum::Router;

use crate::handlers::voices;
use crate::state::AppState;

/// `GET /voices`
pub fn router() -> Router<AppState> {
    Router::new().route("/voices", get(voices::list_voices))
}
