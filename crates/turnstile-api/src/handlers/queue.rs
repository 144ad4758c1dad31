//! Queue handlers — join, position, leave, complete.

use axum::extract::{Query, State};
use axum::Json;

use crate::error::ApiError;

use crate::dto::request::{
    CompleteCheckoutRequest, JoinQueueRequest, LeaveQueueRequest, PositionQuery,
};
use crate::dto::response::{
    ApiResponse, CompleteCheckoutResponse, JoinQueueResponse, LeaveQueueResponse, PositionResponse,
};
use crate::state::AppState;

/// POST /api/queue/join
pub async fn join(
    State(state): State<AppState>,
    Json(req): Json<JoinQueueRequest>,
) -> Result<Json<ApiResponse<JoinQueueResponse>>, ApiError> {
    let result = state.admission.join(req.event_id, req.user_id).await?;

    Ok(Json(ApiResponse::ok(JoinQueueResponse {
        admitted: result.admitted,
        position: result.position,
        reservation_id: result.reservation_id,
    })))
}

/// GET /api/queue/position?event_id=&user_id=
pub async fn position(
    State(state): State<AppState>,
    Query(query): Query<PositionQuery>,
) -> Result<Json<ApiResponse<PositionResponse>>, ApiError> {
    let standing = state
        .admission
        .position(query.event_id, query.user_id)
        .await?;

    Ok(Json(ApiResponse::ok(PositionResponse {
        admitted: standing.admitted,
        position: standing.position,
        total_waiting: standing.total_waiting,
        total_active: standing.total_active,
    })))
}

/// POST /api/queue/leave
pub async fn leave(
    State(state): State<AppState>,
    Json(req): Json<LeaveQueueRequest>,
) -> Result<Json<ApiResponse<LeaveQueueResponse>>, ApiError> {
    let removed = state.admission.leave(req.event_id, req.user_id).await?;

    Ok(Json(ApiResponse::ok(LeaveQueueResponse { removed })))
}

/// POST /api/queue/complete
pub async fn complete(
    State(state): State<AppState>,
    Json(req): Json<CompleteCheckoutRequest>,
) -> Result<Json<ApiResponse<CompleteCheckoutResponse>>, ApiError> {
    let completed = state.admission.complete(req.event_id, req.user_id).await?;

    Ok(Json(ApiResponse::ok(CompleteCheckoutResponse {
        completed,
    })))
}
