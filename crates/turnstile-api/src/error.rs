//! Maps domain `AppError` to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use turnstile_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Transport wrapper around [`AppError`] for Axum handlers.
///
/// Handlers return `Result<_, ApiError>`; the `?` operator converts any
/// `AppError` through the `From` impl below.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// Map an error kind to its HTTP status and machine-readable code.
pub fn status_for(kind: &ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::CapacityExceeded => (StatusCode::CONFLICT, "CAPACITY_EXCEEDED"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::Coordinator => (StatusCode::SERVICE_UNAVAILABLE, "COORDINATOR_UNAVAILABLE"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = status_for(&self.0.kind);

        if status.is_server_error() {
            tracing::error!(kind = %self.0.kind, error = %self.0.message, "Request failed");
        }

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message: self.0.message.clone(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_facing_mappings() {
        assert_eq!(
            status_for(&ErrorKind::NotFound),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            status_for(&ErrorKind::CapacityExceeded),
            (StatusCode::CONFLICT, "CAPACITY_EXCEEDED")
        );
        assert_eq!(
            status_for(&ErrorKind::Coordinator),
            (StatusCode::SERVICE_UNAVAILABLE, "COORDINATOR_UNAVAILABLE")
        );
    }

    #[test]
    fn test_infrastructure_errors_are_opaque_500s() {
        for kind in [
            ErrorKind::Database,
            ErrorKind::Configuration,
            ErrorKind::Serialization,
            ErrorKind::Internal,
        ] {
            assert_eq!(status_for(&kind).0, StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_capacity_exceeded_response_has_conflict_status() {
        let response =
            ApiError(AppError::capacity_exceeded("queue is full")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
