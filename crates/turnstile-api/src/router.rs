//! Route definitions for the Turnstile HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(queue_routes())
        .merge(worker_routes())
        .merge(config_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Queue endpoints: join, position, leave, complete
fn queue_routes() -> Router<AppState> {
    Router::new()
        .route("/queue/join", post(handlers::queue::join))
        .route("/queue/position", get(handlers::queue::position))
        .route("/queue/leave", post(handlers::queue::leave))
        .route("/queue/complete", post(handlers::queue::complete))
}

/// On-demand reconciliation trigger
fn worker_routes() -> Router<AppState> {
    Router::new().route("/worker/run", post(handlers::worker::run))
}

/// Queue configuration CRUD
fn config_routes() -> Router<AppState> {
    Router::new()
        .route("/queue/configs", get(handlers::config::list_configs))
        .route(
            "/queue/config/{event_id}",
            get(handlers::config::get_config),
        )
        .route(
            "/queue/config/{event_id}",
            put(handlers::config::set_config),
        )
        .route(
            "/queue/config/{event_id}",
            delete(handlers::config::delete_config),
        )
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::detailed_health))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use http::Method;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new();

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<http::HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    let methods: Vec<Method> = cors_config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    if cors_config.allowed_headers.contains(&"*".to_string()) {
        cors = cors.allow_headers(Any);
    }

    cors.max_age(std::time::Duration::from_secs(
        cors_config.max_age_seconds,
    ))
}
