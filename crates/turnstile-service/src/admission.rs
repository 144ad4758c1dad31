//! Admission fast path: join, position, leave, complete.
//!
//! Every call goes config-store → coordinator → ledger mirror, in that
//! order. A ledger write failure after a successful coordinator operation
//! is logged and does not undo the admission decision; the coordinator
//! remains authoritative.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use turnstile_coordinator::{
    AdmissionCoordinator, CoordinatorDispatch, JoinOutcome, QueuePosition,
};
use turnstile_core::error::AppError;
use turnstile_core::result::AppResult;
use turnstile_database::repositories::queue_config::QueueConfigRepository;
use turnstile_database::repositories::turn::TurnRepository;
use turnstile_entity::turn::{NewTurn, TurnState};

/// Result of a join request, as surfaced to the gateway.
#[derive(Debug, Clone)]
pub struct JoinResult {
    /// Whether the user may proceed to checkout now.
    pub admitted: bool,
    /// 1-based waiting position; absent when admitted.
    pub position: Option<u64>,
    /// Ledger id of the user's open turn, usable as a reservation handle.
    pub reservation_id: Option<Uuid>,
}

/// Gateway-facing admission service.
#[derive(Debug, Clone)]
pub struct AdmissionService {
    /// Admission coordinator (Redis or in-memory).
    coordinator: Arc<CoordinatorDispatch>,
    /// Queue configuration store.
    config_repo: Arc<QueueConfigRepository>,
    /// Turn ledger.
    turn_repo: Arc<TurnRepository>,
}

impl AdmissionService {
    /// Create a new admission service.
    pub fn new(
        coordinator: Arc<CoordinatorDispatch>,
        config_repo: Arc<QueueConfigRepository>,
        turn_repo: Arc<TurnRepository>,
    ) -> Self {
        Self {
            coordinator,
            config_repo,
            turn_repo,
        }
    }

    /// Join the queue for an event.
    ///
    /// Idempotent: a repeated join returns the user's existing standing and
    /// never creates a second open turn. Fails with `CapacityExceeded` when
    /// the queue is at its maximum total size.
    pub async fn join(&self, event_id: Uuid, user_id: Uuid) -> AppResult<JoinResult> {
        let config = self.config_repo.get_by_event_id(event_id).await?;
        let limits = config.limits();
        let now = Utc::now();

        let outcome = self
            .coordinator
            .join(event_id, user_id, &limits, now)
            .await?;

        match outcome {
            JoinOutcome::Admitted => {
                let turn_id = self
                    .mirror_admitted(event_id, user_id)
                    .await;
                Ok(JoinResult {
                    admitted: true,
                    position: None,
                    reservation_id: turn_id,
                })
            }
            JoinOutcome::Waiting { position } => {
                let turn_id = self
                    .mirror_waiting(event_id, user_id, position)
                    .await;
                Ok(JoinResult {
                    admitted: false,
                    position: Some(position),
                    reservation_id: turn_id,
                })
            }
            JoinOutcome::QueueFull => Err(AppError::capacity_exceeded(format!(
                "Queue for event {event_id} is at capacity, try again later"
            ))),
        }
    }

    /// Read the user's current standing in an event's queue.
    ///
    /// Fails with `NotFound` when the user is neither active nor waiting.
    pub async fn position(&self, event_id: Uuid, user_id: Uuid) -> AppResult<QueuePosition> {
        // Config presence is checked first so an unconfigured event is
        // reported as such, not as "not in queue".
        self.config_repo.get_by_event_id(event_id).await?;

        self.coordinator
            .position(event_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("User {user_id} is not in the queue for {event_id}"))
            })
    }

    /// Leave an event's queue, whichever side of it the user is on.
    ///
    /// Leaving frees capacity but never promotes — promotion belongs to the
    /// reconciliation worker.
    pub async fn leave(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let outcome = self.coordinator.leave(event_id, user_id).await?;

        if outcome.removed() {
            if let Err(e) = self.turn_repo.mark_abandoned(event_id, user_id).await {
                error!(%event_id, %user_id, error = %e, "Failed to mirror leave into ledger");
            }
        }

        Ok(outcome.removed())
    }

    /// Record a successful checkout, releasing the user's active slot.
    ///
    /// Returns `false` when no live reservation exists (the window already
    /// lapsed; reclamation owns that outcome).
    pub async fn complete(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let completed = self.coordinator.complete(event_id, user_id).await?;

        if completed {
            if let Err(e) = self.turn_repo.mark_completed(event_id, user_id).await {
                error!(%event_id, %user_id, error = %e, "Failed to mirror completion into ledger");
            }
        } else {
            warn!(%event_id, %user_id, "Completion without live reservation");
        }

        Ok(completed)
    }

    /// Mirror an admitted join. Reuses the open turn when the join was
    /// idempotent; otherwise creates an active turn row.
    async fn mirror_admitted(&self, event_id: Uuid, user_id: Uuid) -> Option<Uuid> {
        let open = match self.turn_repo.find_open(event_id, user_id).await {
            Ok(open) => open,
            Err(e) => {
                error!(%event_id, %user_id, error = %e, "Failed to read open turn for mirroring");
                return None;
            }
        };

        if let Some(turn) = open {
            if turn.state == TurnState::Waiting {
                // Ledger lagged behind a promotion; catch it up.
                if let Err(e) = self.turn_repo.mark_active(event_id, user_id, Utc::now()).await {
                    error!(%event_id, %user_id, error = %e, "Failed to mirror admission into ledger");
                }
            }
            return Some(turn.id);
        }

        let new_turn = NewTurn {
            event_id,
            user_id,
            state: TurnState::Active,
            position: None,
            admitted_at: Some(Utc::now()),
        };
        match self.turn_repo.create(&new_turn).await {
            Ok(turn) => Some(turn.id),
            Err(e) => {
                error!(%event_id, %user_id, error = %e, "Failed to mirror admission into ledger");
                None
            }
        }
    }

    /// Mirror a waiting join. No-op when the join was idempotent.
    async fn mirror_waiting(&self, event_id: Uuid, user_id: Uuid, position: u64) -> Option<Uuid> {
        let open = match self.turn_repo.find_open(event_id, user_id).await {
            Ok(open) => open,
            Err(e) => {
                error!(%event_id, %user_id, error = %e, "Failed to read open turn for mirroring");
                return None;
            }
        };

        if let Some(turn) = open {
            return Some(turn.id);
        }

        let new_turn = NewTurn {
            event_id,
            user_id,
            state: TurnState::Waiting,
            position: Some(position as i32),
            admitted_at: None,
        };
        match self.turn_repo.create(&new_turn).await {
            Ok(turn) => Some(turn.id),
            Err(e) => {
                error!(%event_id, %user_id, error = %e, "Failed to mirror waiting turn into ledger");
                None
            }
        }
    }
}
