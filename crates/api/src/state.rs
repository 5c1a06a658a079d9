use std::sync::Arc;

use voxdub_events::EventBus;
use voxdub_pipeline::Pipeline;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is an `Arc` or a bundle of them.
#[derive(Clone)]
pub struct AppState {
    /// Job producers, ledger and status queries.
    pub pipeline: Pipeline,
    /// Bus the ledger publishes job transitions on.
    pub event_bus: Arc<EventBus>,
    /// Database pool when running against PostgreSQL; `None` with the
    /// in-memory store.
    pub pool: Option<voxdub_db::DbPool>,
    pub config: Arc<ServerConfig>,
}
