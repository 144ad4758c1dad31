//! Turn ledger repository implementation.
//!
//! Every coordinator state transition is mirrored here exactly once, by the
//! component that made it. Rows are appended and updated, never deleted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use turnstile_core::error::{AppError, ErrorKind};
use turnstile_core::result::AppResult;
use turnstile_entity::turn::{NewTurn, Turn, TurnState};

/// Repository for turn ledger rows.
#[derive(Debug, Clone)]
pub struct TurnRepository {
    pool: PgPool,
}

impl TurnRepository {
    /// Create a new turn repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new turn row.
    pub async fn create(&self, new_turn: &NewTurn) -> AppResult<Turn> {
        sqlx::query_as::<_, Turn>(
            "INSERT INTO turns (id, event_id, user_id, state, position, entered_waiting_at, admitted_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), $6) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new_turn.event_id)
        .bind(new_turn.user_id)
        .bind(new_turn.state)
        .bind(new_turn.position)
        .bind(new_turn.admitted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create turn", e))
    }

    /// Find a user's open (waiting or active) turn for an event.
    pub async fn find_open(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<Turn>> {
        sqlx::query_as::<_, Turn>(
            "SELECT * FROM turns \
             WHERE event_id = $1 AND user_id = $2 AND state IN ('waiting', 'active')",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find open turn", e))
    }

    /// Mark a user's waiting turn as active.
    pub async fn mark_active(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        admitted_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE turns SET state = 'active', position = NULL, admitted_at = $3, updated_at = NOW() \
             WHERE event_id = $1 AND user_id = $2 AND state = 'waiting'",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(admitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark turn active", e))?;
        Ok(())
    }

    /// Mark the waiting turns of many users as active in one statement.
    ///
    /// Used by the reconciliation worker after a promotion pass.
    pub async fn mark_active_many(
        &self,
        event_id: Uuid,
        user_ids: &[Uuid],
        admitted_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE turns SET state = 'active', position = NULL, admitted_at = $3, updated_at = NOW() \
             WHERE event_id = $1 AND user_id = ANY($2) AND state = 'waiting'",
        )
        .bind(event_id)
        .bind(user_ids)
        .bind(admitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark turns active", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Mark a user's open turn as abandoned.
    pub async fn mark_abandoned(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE turns SET state = 'abandoned', finished_at = NOW(), updated_at = NOW() \
             WHERE event_id = $1 AND user_id = $2 AND state IN ('waiting', 'active')",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark turn abandoned", e)
        })?;
        Ok(())
    }

    /// Mark the active turns of many users as abandoned in one statement.
    ///
    /// Used by the reconciliation worker after reclaiming lapsed slots.
    pub async fn mark_abandoned_many(&self, event_id: Uuid, user_ids: &[Uuid]) -> AppResult<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "UPDATE turns SET state = 'abandoned', finished_at = NOW(), updated_at = NOW() \
             WHERE event_id = $1 AND user_id = ANY($2) AND state = 'active'",
        )
        .bind(event_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark turns abandoned", e)
        })?;

        Ok(result.rows_affected())
    }

    /// Mark a user's active turn as completed.
    pub async fn mark_completed(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE turns SET state = 'completed', finished_at = NOW(), updated_at = NOW() \
             WHERE event_id = $1 AND user_id = $2 AND state = 'active'",
        )
        .bind(event_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark turn completed", e)
        })?;
        Ok(())
    }

    /// List turns for an event, newest first.
    pub async fn find_by_event(&self, event_id: Uuid, limit: i64) -> AppResult<Vec<Turn>> {
        sqlx::query_as::<_, Turn>(
            "SELECT * FROM turns WHERE event_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(event_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list turns", e))
    }
}
