//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use turnstile_entity::queue::QueueConfig;
use turnstile_service::EventPassReport;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Join response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinQueueResponse {
    /// Whether the user may proceed to checkout now.
    pub admitted: bool,
    /// 1-based waiting position; absent when admitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    /// Handle for the user's reservation (the open turn id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<Uuid>,
}

/// Position response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    /// Whether the user holds an active slot.
    pub admitted: bool,
    /// 1-based waiting position; absent when admitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    /// Total users waiting for the event.
    pub total_waiting: u64,
    /// Total users holding active slots.
    pub total_active: u64,
}

/// Leave response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveQueueResponse {
    /// Whether anything was removed.
    pub removed: bool,
}

/// Checkout completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteCheckoutResponse {
    /// Whether a live reservation was completed.
    pub completed: bool,
}

/// On-demand worker run response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRunResponse {
    /// One report per processed event.
    pub results: Vec<EventPassReport>,
}

/// Queue configuration for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfigResponse {
    /// The configured event.
    pub event_id: Uuid,
    /// Maximum concurrent buyers in checkout.
    pub max_concurrent: i32,
    /// Maximum total participants.
    pub max_users: i32,
    /// Checkout window in seconds.
    pub reservation_ttl_seconds: i32,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last changed at.
    pub updated_at: DateTime<Utc>,
}

impl From<QueueConfig> for QueueConfigResponse {
    fn from(config: QueueConfig) -> Self {
        Self {
            event_id: config.event_id,
            max_concurrent: config.max_concurrent,
            max_users: config.max_users,
            reservation_ttl_seconds: config.reservation_ttl_seconds,
            created_at: config.created_at,
            updated_at: config.updated_at,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database status.
    pub database: String,
    /// Coordinator status.
    pub coordinator: String,
}
