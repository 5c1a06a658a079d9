use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voxdub_api::config::ServerConfig;
use voxdub_api::router::build_app_router;
use voxdub_api::state::AppState;
use voxdub_core::voices::VoiceCatalog;
use voxdub_db::{InMemoryStore, PgStore, PipelineStore};
use voxdub_events::EventBus;
use voxdub_pipeline::{Pipeline, PipelineConfig, PipelineDeps, StaleJobWatchdog};
use voxdub_speech::stt::HttpSpeechToText;
use voxdub_speech::tts::HttpTextToSpeech;
use voxdub_speech::{SttConfig, TtsConfig};
use voxdub_storage::{build_artifact_store, StorageConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::try_from_env()?;
    let pipeline_config = PipelineConfig::try_from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let (store, pool) = match voxdub_core::env::var("DATABASE_URL") {
        Some(database_url) => {
            let pool = voxdub_db::create_pool(&database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            voxdub_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            voxdub_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            let store: Arc<dyn PipelineStore> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; jobs are lost on restart");
            let store: Arc<dyn PipelineStore> = Arc::new(InMemoryStore::new());
            (store, None)
        }
    };

    // --- Adapters ---
    let stt = HttpSpeechToText::new(SttConfig::try_from_env()?);
    let tts = HttpTextToSpeech::new(TtsConfig::try_from_env()?);
    let storage_config = StorageConfig::try_from_env()?;
    let artifacts = build_artifact_store(&storage_config)
        .await
        .context("Failed to initialise artifact store")?;
    let voices = load_voice_catalog().await?;

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    let pipeline_timeout = pipeline_config.stale_job_timeout;
    let watchdog_interval = pipeline_config.watchdog_interval;
    let watchdog_store = Arc::clone(&store);
    let pipeline = Pipeline::new(PipelineDeps {
        store,
        events: Arc::clone(&event_bus),
        stt: Arc::new(stt),
        tts: Arc::new(tts),
        artifacts,
        voices: Arc::new(voices),
        config: Arc::new(pipeline_config),
    });

    // The worker binary cannot see an in-memory store, so the watchdog runs
    // here instead.
    let watchdog_cancel = tokio_util::sync::CancellationToken::new();
    let watchdog_handle = pool.is_none().then(|| {
        let watchdog = StaleJobWatchdog::new(
            pipeline.ledger.clone(),
            Arc::clone(&watchdog_store),
            pipeline_timeout,
            watchdog_interval,
        );
        let cancel = watchdog_cancel.clone();
        tokio::spawn(async move { watchdog.run(cancel).await })
    });

    // --- App state ---
    let state = AppState {
        pipeline,
        event_bus,
        pool,
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    watchdog_cancel.cancel();
    if let Some(handle) = watchdog_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// `RUST_LOG` filters; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "voxdub_api=debug,voxdub_pipeline=debug,tower_http=debug".into());

    let json = voxdub_core::env::var("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Built-in voices, or the JSON list at `VOICE_CATALOG_PATH`.
async fn load_voice_catalog() -> anyhow::Result<VoiceCatalog> {
    let Some(path) = voxdub_core::env::var("VOICE_CATALOG_PATH") else {
        return Ok(VoiceCatalog::default());
    };
    let json = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read voice catalog {path}"))?;
    let catalog = VoiceCatalog::from_json(&json)?;
    tracing::info!(path = %path, languages = catalog.languages().count(), "Loaded voice catalog");
    Ok(catalog)
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
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
