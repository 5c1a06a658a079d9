use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use voxdub_core::voices::Voice;

use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoiceQuery {
    pub language: Option<String>,
}

/// GET /api/v1/voices?language=
///
/// Without `language` the whole catalog is returned.
pub async fn list_voices(
    State(state): State<AppState>,
    Query(params): Query<VoiceQuery>,
) -> Json<DataResponse<Vec<Voice>>> {
    Json(DataResponse {
        data: state.pipeline.status.list_voices(params.language.as_deref()),
    })
}
