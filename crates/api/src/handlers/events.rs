//! Server-sent-event stream of job transitions.
//!
//! Polling `GET /jobs/{id}` stays the primary way to follow a job; this
//! stream is the push alternative fed by the event bus.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use voxdub_core::types::DbId;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Only forward events of this job.
    pub job_id: Option<DbId>,
}

/// GET /api/v1/events
///
/// Each SSE message is named after the event type (`job.completed`, ...)
/// and carries the serialized event as JSON data.
pub async fn stream_events(
    State(state): State<AppState>,
    Query(params): Query<EventStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let job_filter = params.job_id;
    let receiver = state.event_bus.subscribe();
    tracing::debug!(job_id = ?job_filter, "Event stream opened");

    let stream = BroadcastStream::new(receiver).filter_map(move |received| {
        let event = match received {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event stream subscriber lagged");
                return None;
            }
        };
        if job_filter.is_some() && event.job_id() != job_filter {
            return None;
        }
        match Event::default().event(&event.event_type).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
