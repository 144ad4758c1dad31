//! Turn entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::state::TurnState;

/// Durable record of one user's participation in one event's queue.
///
/// Turns are the audit trail of the admission engine: created when a user
/// first joins, updated on every state transition, never physically deleted.
/// Admission decisions are never made from this table — the coordinator is
/// the sole source of truth for the live queue.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Turn {
    /// Unique turn identifier.
    pub id: Uuid,
    /// The event whose queue this turn belongs to.
    pub event_id: Uuid,
    /// The participating user.
    pub user_id: Uuid,
    /// Current lifecycle state.
    pub state: TurnState,
    /// Queue position at the time of joining (cleared once admitted).
    pub position: Option<i32>,
    /// When the user entered the queue.
    pub entered_waiting_at: DateTime<Utc>,
    /// When the user was admitted to checkout.
    pub admitted_at: Option<DateTime<Utc>>,
    /// When the turn reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Row update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Turn {
    /// Whether this turn is still open (waiting or active).
    pub fn is_open(&self) -> bool {
        !self.state.is_terminal()
    }
}

/// Data required to create a new turn row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTurn {
    /// The event whose queue is being joined.
    pub event_id: Uuid,
    /// The participating user.
    pub user_id: Uuid,
    /// Initial state: `Waiting`, or `Active` when admitted immediately.
    pub state: TurnState,
    /// 1-based queue position for waiting turns.
    pub position: Option<i32>,
    /// Admission timestamp for immediately admitted turns.
    pub admitted_at: Option<DateTime<Utc>>,
}
