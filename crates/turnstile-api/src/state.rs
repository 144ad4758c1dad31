//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use turnstile_coordinator::CoordinatorDispatch;
use turnstile_core::config::AppConfig;
use turnstile_database::repositories::queue_config::QueueConfigRepository;
use turnstile_database::repositories::turn::TurnRepository;
use turnstile_service::{AdmissionService, ReconciliationService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Admission coordinator (Redis or in-memory).
    pub coordinator: Arc<CoordinatorDispatch>,
    /// Queue configuration store.
    pub config_repo: Arc<QueueConfigRepository>,
    /// Turn ledger.
    pub turn_repo: Arc<TurnRepository>,
    /// Admission fast-path service.
    pub admission: Arc<AdmissionService>,
    /// Reconciliation service (worker pass on demand).
    pub reconciliation: Arc<ReconciliationService>,
}
