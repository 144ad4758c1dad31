//! Admission coordinator trait and shared types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use turnstile_core::config::coordinator::CoordinatorConfig;
use turnstile_core::error::AppError;
use turnstile_core::result::AppResult;
use turnstile_entity::queue::QueueLimits;

/// Result of attempting to join an event's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    /// The user holds an active slot and may proceed to checkout.
    ///
    /// Also returned when the user already held a slot (idempotent join).
    Admitted,
    /// The user is waiting at the given 1-based position.
    ///
    /// Also returned when the user was already waiting (idempotent join).
    Waiting {
        /// 1-based rank in the waiting list.
        position: u64,
    },
    /// The queue has reached its maximum total size; the join was refused.
    QueueFull,
}

/// Result of removing a user from an event's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveOutcome {
    /// An active slot was released. Capacity is freed, but promotion is
    /// left to the reconciliation worker.
    ActiveRemoved,
    /// A waiting entry was removed.
    WaitingRemoved,
    /// The user was in neither structure.
    NotPresent,
}

impl LeaveOutcome {
    /// Whether anything was removed.
    pub fn removed(&self) -> bool {
        !matches!(self, Self::NotPresent)
    }
}

/// A user's current standing in an event's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePosition {
    /// Whether the user holds an active slot.
    pub admitted: bool,
    /// 1-based rank in the waiting list; absent when admitted.
    pub position: Option<u64>,
    /// Total users currently waiting for the event.
    pub total_waiting: u64,
    /// Total users currently holding active slots for the event.
    pub total_active: u64,
}

/// Aggregate queue counters for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Users in the waiting list.
    pub waiting: u64,
    /// Users holding active slots.
    pub active: u64,
}

/// Trait for the ephemeral admission coordinator.
///
/// Implementations must make every capacity-changing operation (`join`,
/// `reclaim_expired`, `promote`) atomic with respect to the others for the
/// same event, across all processes sharing the store. Reads (`position`,
/// `counts`) need no such guarantee.
#[async_trait]
pub trait AdmissionCoordinator: Send + Sync + std::fmt::Debug {
    /// Attempt to join the queue for an event.
    ///
    /// Idempotent: a user already active or waiting gets their existing
    /// standing back without a duplicate entry. Otherwise the user is
    /// admitted if an active slot is free, refused if the queue is at
    /// `max_users`, and appended to the waiting list in all other cases.
    async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<JoinOutcome>;

    /// Read a user's current standing. `None` if the user is in neither the
    /// active set nor the waiting list.
    async fn position(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<QueuePosition>>;

    /// Remove whichever of the user's active slot / waiting entry exists.
    ///
    /// Never promotes — promotion is the reconciliation worker's exclusive
    /// responsibility, keeping this write path O(1).
    async fn leave(&self, event_id: Uuid, user_id: Uuid) -> AppResult<LeaveOutcome>;

    /// Release an active slot on successful checkout.
    ///
    /// Returns `false` when the user holds no live reservation (the window
    /// already lapsed and reclamation owns the outcome).
    async fn complete(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Remove every active slot whose checkout window has lapsed and return
    /// the affected user ids, oldest expiry first.
    async fn reclaim_expired(&self, event_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<Uuid>>;

    /// Move up to `max_concurrent - |active|` users from the front of the
    /// waiting list into active slots. Returns the newly admitted user ids
    /// in promotion order.
    async fn promote(
        &self,
        event_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>>;

    /// Current waiting/active totals for an event.
    async fn counts(&self, event_id: Uuid) -> AppResult<QueueCounts>;

    /// Check connectivity to the backing store.
    async fn health_check(&self) -> AppResult<bool>;
}

use crate::memory::MemoryCoordinator;
use crate::redis::RedisCoordinator;

/// Dispatcher for coordinator implementations.
///
/// Switches between in-memory and Redis-based coordination based on
/// configuration.
#[derive(Debug, Clone)]
pub enum CoordinatorDispatch {
    /// In-memory coordinator (single node, tests).
    Memory(MemoryCoordinator),
    /// Redis-based coordinator (multi-node).
    Redis(RedisCoordinator),
}

impl CoordinatorDispatch {
    /// Create a coordinator from configuration.
    pub async fn from_config(config: &CoordinatorConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "redis" => {
                let coordinator = RedisCoordinator::connect(&config.redis).await?;
                Ok(Self::Redis(coordinator))
            }
            "memory" => Ok(Self::Memory(MemoryCoordinator::new())),
            other => Err(AppError::configuration(format!(
                "Unknown coordinator provider: '{other}'. Supported: memory, redis"
            ))),
        }
    }
}

#[async_trait]
impl AdmissionCoordinator for CoordinatorDispatch {
    async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<JoinOutcome> {
        match self {
            Self::Memory(inner) => inner.join(event_id, user_id, limits, now).await,
            Self::Redis(inner) => inner.join(event_id, user_id, limits, now).await,
        }
    }

    async fn position(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<QueuePosition>> {
        match self {
            Self::Memory(inner) => inner.position(event_id, user_id).await,
            Self::Redis(inner) => inner.position(event_id, user_id).await,
        }
    }

    async fn leave(&self, event_id: Uuid, user_id: Uuid) -> AppResult<LeaveOutcome> {
        match self {
            Self::Memory(inner) => inner.leave(event_id, user_id).await,
            Self::Redis(inner) => inner.leave(event_id, user_id).await,
        }
    }

    async fn complete(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        match self {
            Self::Memory(inner) => inner.complete(event_id, user_id).await,
            Self::Redis(inner) => inner.complete(event_id, user_id).await,
        }
    }

    async fn reclaim_expired(&self, event_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        match self {
            Self::Memory(inner) => inner.reclaim_expired(event_id, now).await,
            Self::Redis(inner) => inner.reclaim_expired(event_id, now).await,
        }
    }

    async fn promote(
        &self,
        event_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        match self {
            Self::Memory(inner) => inner.promote(event_id, limits, now).await,
            Self::Redis(inner) => inner.promote(event_id, limits, now).await,
        }
    }

    async fn counts(&self, event_id: Uuid) -> AppResult<QueueCounts> {
        match self {
            Self::Memory(inner) => inner.counts(event_id).await,
            Self::Redis(inner) => inner.counts(event_id).await,
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self {
            Self::Memory(inner) => inner.health_check().await,
            Self::Redis(inner) => inner.health_check().await,
        }
    }
}
