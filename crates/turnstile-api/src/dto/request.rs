//! Request DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Body for joining an event's queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinQueueRequest {
    /// The event whose queue to join.
    pub event_id: Uuid,
    /// The joining user.
    pub user_id: Uuid,
}

/// Query parameters for reading a queue position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionQuery {
    /// The event being queried.
    pub event_id: Uuid,
    /// The user being queried.
    pub user_id: Uuid,
}

/// Body for leaving an event's queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveQueueRequest {
    /// The event whose queue to leave.
    pub event_id: Uuid,
    /// The leaving user.
    pub user_id: Uuid,
}

/// Body for signalling a completed checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteCheckoutRequest {
    /// The event the checkout belongs to.
    pub event_id: Uuid,
    /// The user who completed checkout.
    pub user_id: Uuid,
}

/// Body for an on-demand worker run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunWorkerRequest {
    /// Restrict the run to one event; all configured events when absent.
    #[serde(default)]
    pub event_id: Option<Uuid>,
}

/// Body for creating or replacing an event's queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetConfigRequest {
    /// Maximum concurrent buyers in checkout.
    #[validate(range(min = 1))]
    pub max_concurrent: i32,
    /// Maximum total participants before joins are refused.
    #[validate(range(min = 1))]
    pub max_users: i32,
    /// Checkout window in seconds; server default applies when absent.
    #[validate(range(min = 1, max = 86400))]
    pub reservation_ttl_seconds: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_config_rejects_zero_capacity() {
        let req = SetConfigRequest {
            max_concurrent: 0,
            max_users: 10,
            reservation_ttl_seconds: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_set_config_accepts_valid_request() {
        let req = SetConfigRequest {
            max_concurrent: 5,
            max_users: 100,
            reservation_ttl_seconds: Some(300),
        };
        assert!(req.validate().is_ok());
    }
}
