//! On-demand worker run handler.

use axum::extract::State;
use axum::Json;

use crate::error::ApiError;

use crate::dto::request::RunWorkerRequest;
use crate::dto::response::{ApiResponse, WorkerRunResponse};
use crate::state::AppState;

/// POST /api/worker/run
///
/// Runs one reconciliation pass immediately: for the named event, or for
/// every configured event when the body omits `event_id`.
pub async fn run(
    State(state): State<AppState>,
    body: Option<Json<RunWorkerRequest>>,
) -> Result<Json<ApiResponse<WorkerRunResponse>>, ApiError> {
    let event_id = body.and_then(|Json(req)| req.event_id);

    let results = match event_id {
        Some(event_id) => vec![state.reconciliation.run_event(event_id).await?],
        None => state.reconciliation.run_all().await?,
    };

    Ok(Json(ApiResponse::ok(WorkerRunResponse { results })))
}
