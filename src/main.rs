//! Turnstile Server — Waiting-Room Admission Engine
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use turnstile_core::config::AppConfig;
use turnstile_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("TURNSTILE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
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
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Turnstile v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db_pool = turnstile_database::connection::create_pool(&config.database).await?;

    tracing::info!("Running database migrations...");
    turnstile_database::migration::run_migrations(&db_pool).await?;

    // ── Step 2: Initialize admission coordinator ─────────────────
    tracing::info!(
        "Initializing admission coordinator (provider: {})...",
        config.coordinator.provider
    );
    let coordinator = Arc::new(
        turnstile_coordinator::CoordinatorDispatch::from_config(&config.coordinator).await?,
    );
    tracing::info!("Admission coordinator initialized");

    // ── Step 3: Initialize repositories ──────────────────────────
    let config_repo = Arc::new(
        turnstile_database::repositories::queue_config::QueueConfigRepository::new(db_pool.clone()),
    );
    let turn_repo = Arc::new(turnstile_database::repositories::turn::TurnRepository::new(
        db_pool.clone(),
    ));

    // ── Step 4: Initialize services ──────────────────────────────
    let admission = Arc::new(turnstile_service::AdmissionService::new(
        Arc::clone(&coordinator),
        Arc::clone(&config_repo),
        Arc::clone(&turn_repo),
    ));
    let reconciliation = Arc::new(turnstile_service::ReconciliationService::new(
        Arc::clone(&coordinator),
        Arc::clone(&config_repo),
        Arc::clone(&turn_repo),
    ));
    tracing::info!("Services initialized");

    // ── Step 5: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 6: Start reconciliation worker ──────────────────────
    let worker_handle = if config.worker.enabled {
        let worker = turnstile_worker::ReconciliationWorker::new(
            Arc::clone(&reconciliation),
            config.worker.clone(),
        );

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            worker.run(worker_cancel).await;
        });

        tracing::info!("Reconciliation worker started");
        Some(handle)
    } else {
        tracing::info!("Reconciliation worker disabled");
        None
    };

    // ── Step 7: Build and start HTTP server ──────────────────────
    let app_state = turnstile_api::state::AppState {
        config: Arc::new(config.clone()),
        db_pool: db_pool.clone(),
        coordinator: Arc::clone(&coordinator),
        config_repo: Arc::clone(&config_repo),
        turn_repo: Arc::clone(&turn_repo),
        admission: Arc::clone(&admission),
        reconciliation: Arc::clone(&reconciliation),
    };

    let app = turnstile_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Turnstile server listening on {}", addr);

    // ── Step 8: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 9: Wait for background tasks ────────────────────────
    if let Some(handle) = worker_handle {
        let grace = std::time::Duration::from_secs(config.server.shutdown_grace_seconds);
        let _ = tokio::time::timeout(grace, handle).await;
    }

    db_pool.close().await;
    tracing::info!("Turnstile server shut down gracefully");
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
