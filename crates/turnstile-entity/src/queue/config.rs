//! Per-event queue capacity policy.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Capacity policy for one event's admission queue.
///
/// One row per event. Written by the administrative surface, read by every
/// admission path. An event without a row has no queue at all — admission
/// requests against it are rejected rather than given invented defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueConfig {
    /// The event this queue belongs to.
    pub event_id: Uuid,
    /// Maximum number of buyers allowed in checkout at the same time.
    pub max_concurrent: i32,
    /// Maximum total participants (active + waiting) before joins are refused.
    pub max_users: i32,
    /// Checkout window in seconds: how long an admitted buyer holds a slot.
    pub reservation_ttl_seconds: i32,
    /// When the configuration was created.
    pub created_at: DateTime<Utc>,
    /// When the configuration was last changed.
    pub updated_at: DateTime<Utc>,
}

impl QueueConfig {
    /// The capacity limits handed to the admission coordinator.
    pub fn limits(&self) -> QueueLimits {
        QueueLimits {
            max_concurrent: self.max_concurrent.max(1) as u32,
            max_users: self.max_users.max(1) as u32,
            reservation_ttl: Duration::from_secs(self.reservation_ttl_seconds.max(1) as u64),
        }
    }
}

/// Capacity limits as consumed by the admission coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLimits {
    /// Maximum concurrent active slots.
    pub max_concurrent: u32,
    /// Maximum total participants (active + waiting).
    pub max_users: u32,
    /// Active-slot TTL (the checkout window).
    pub reservation_ttl: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_clamp_to_at_least_one() {
        let config = QueueConfig {
            event_id: Uuid::nil(),
            max_concurrent: 0,
            max_users: -3,
            reservation_ttl_seconds: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let limits = config.limits();
        assert_eq!(limits.max_concurrent, 1);
        assert_eq!(limits.max_users, 1);
        assert_eq!(limits.reservation_ttl, Duration::from_secs(1));
    }
}
