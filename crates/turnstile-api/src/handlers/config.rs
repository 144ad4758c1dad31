//! Queue configuration handlers.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use turnstile_core::error::AppError;

use crate::error::ApiError;

use crate::dto::request::SetConfigRequest;
use crate::dto::response::{ApiResponse, MessageResponse, QueueConfigResponse};
use crate::state::AppState;

/// GET /api/queue/config/{event_id}
pub async fn get_config(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ApiResponse<QueueConfigResponse>>, ApiError> {
    let config = state.config_repo.get_by_event_id(event_id).await?;
    Ok(Json(ApiResponse::ok(config.into())))
}

/// PUT /api/queue/config/{event_id}
pub async fn set_config(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<SetConfigRequest>,
) -> Result<Json<ApiResponse<QueueConfigResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let ttl = req
        .reservation_ttl_seconds
        .unwrap_or(state.config.queue.default_reservation_ttl_seconds as i32);

    let config = state
        .config_repo
        .upsert(event_id, req.max_concurrent, req.max_users, ttl)
        .await?;

    Ok(Json(ApiResponse::ok(config.into())))
}

/// DELETE /api/queue/config/{event_id}
pub async fn delete_config(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let removed = state.config_repo.delete(event_id).await?;
    if !removed {
        return Err(AppError::not_found(format!(
            "No queue configured for event {event_id}"
        ))
        .into());
    }

    Ok(Json(ApiResponse::ok(MessageResponse {
        message: format!("Queue configuration for event {event_id} deleted"),
    })))
}

/// GET /api/queue/configs
pub async fn list_configs(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<QueueConfigResponse>>>, ApiError> {
    let configs = state.config_repo.find_all().await?;
    Ok(Json(ApiResponse::ok(
        configs.into_iter().map(Into::into).collect(),
    )))
}
