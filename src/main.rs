//! Publink server: shareable download links over an object-storage cluster.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use publink_core::config::AppConfig;
use publink_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("PUBLINK_CONFIG").unwrap_or_else(|_| "publink.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Publink v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Object store ─────────────────────────────────────
    tracing::info!(
        "Initializing object store (provider: {})...",
        config.storage.provider
    );
    let store = publink_storage::build_store(&config.storage).await?;
    store.ensure_volume(&config.storage.share_volume).await?;
    tracing::info!(
        "Object store ready (share volume: {})",
        config.storage.share_volume
    );

    // ── Step 2: Auth primitives ──────────────────────────────────
    let hasher = Arc::new(publink_auth::PasswordHasher::new());
    let sessions = Arc::new(publink_auth::SessionAuthCache::new());

    // ── Step 3: Services ─────────────────────────────────────────
    let share_service = Arc::new(publink_service::ShareService::new(
        Arc::clone(&store),
        Arc::clone(&hasher),
        config.share.clone(),
        config.storage.share_volume.clone(),
    ));
    let access_service = Arc::new(publink_service::AccessService::new(
        Arc::clone(&store),
        Arc::clone(&hasher),
        config.storage.share_volume.clone(),
    ));

    // ── Step 4: Scheduler ────────────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        tracing::info!("Starting job scheduler...");
        let mailer = publink_mail::build_mailer(&config.mail)?;

        let sweep = Arc::new(publink_worker::SweepJob::new(
            Arc::clone(&store),
            config.storage.share_volume.clone(),
        ));
        let digest = Arc::new(publink_worker::DigestJob::new(
            Arc::clone(&store),
            mailer,
            config.mail.clone(),
            config.server.clone(),
            config.storage.share_volume.clone(),
        ));
        let prune = Arc::new(publink_worker::jobs::session::SessionPruneJob::new(
            Arc::clone(&sessions),
            config.worker.session_idle_seconds,
        ));

        let scheduler = publink_worker::CronScheduler::new().await?;
        scheduler
            .register_jobs(&config.worker, sweep, digest, prune)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Job scheduler disabled");
        None
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let app_state = publink_api::AppState {
        config: Arc::new(config.clone()),
        store: Arc::clone(&store),
        share_service,
        access_service,
        sessions,
    };

    let app = publink_api::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Publink server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(ref mut scheduler) = scheduler {
        scheduler.shutdown().await?;
    }

    tracing::info!("Publink server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
