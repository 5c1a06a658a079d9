//! Background worker: runs the stale-job watchdog against PostgreSQL.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voxdub_db::{PgStore, PipelineStore};
use voxdub_events::EventBus;
use voxdub_pipeline::{JobLedger, PipelineConfig, StaleJobWatchdog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let json_logs =
        voxdub_core::env::var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "voxdub_worker=debug,voxdub_pipeline=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = PipelineConfig::try_from_env()?;
    let database_url = voxdub_core::env::required("DATABASE_URL")?;

    let pool = voxdub_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    voxdub_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    let store: Arc<dyn PipelineStore> = Arc::new(PgStore::new(pool));
    let ledger = JobLedger::new(Arc::clone(&store), Arc::new(EventBus::default()));
    let watchdog = StaleJobWatchdog::new(
        ledger,
        store,
        config.stale_job_timeout,
        config.watchdog_interval,
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { watchdog.run(cancel).await }
    });
    tracing::info!(
        timeout_secs = config.stale_job_timeout.as_secs(),
        interval_secs = config.watchdog_interval.as_secs(),
        "Worker started"
    );

    shutdown_signal().await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    tracing::info!("Worker stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
