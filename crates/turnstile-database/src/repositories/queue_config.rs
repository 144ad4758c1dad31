//! Queue configuration repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use turnstile_core::error::{AppError, ErrorKind};
use turnstile_core::result::AppResult;
use turnstile_entity::queue::QueueConfig;

/// Repository for per-event queue configuration CRUD operations.
#[derive(Debug, Clone)]
pub struct QueueConfigRepository {
    pool: PgPool,
}

impl QueueConfigRepository {
    /// Create a new queue configuration repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the queue configuration for an event.
    pub async fn find_by_event_id(&self, event_id: Uuid) -> AppResult<Option<QueueConfig>> {
        sqlx::query_as::<_, QueueConfig>("SELECT * FROM queue_configs WHERE event_id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find queue config", e)
            })
    }

    /// Find the queue configuration for an event, failing if absent.
    ///
    /// The engine never invents a default config: an event with no row has
    /// no queue, and admission requests against it are caller errors.
    pub async fn get_by_event_id(&self, event_id: Uuid) -> AppResult<QueueConfig> {
        self.find_by_event_id(event_id).await?.ok_or_else(|| {
            AppError::not_found(format!("No queue configured for event {event_id}"))
        })
    }

    /// Create or replace the queue configuration for an event.
    pub async fn upsert(
        &self,
        event_id: Uuid,
        max_concurrent: i32,
        max_users: i32,
        reservation_ttl_seconds: i32,
    ) -> AppResult<QueueConfig> {
        sqlx::query_as::<_, QueueConfig>(
            "INSERT INTO queue_configs (event_id, max_concurrent, max_users, reservation_ttl_seconds) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (event_id) DO UPDATE SET \
                max_concurrent = EXCLUDED.max_concurrent, \
                max_users = EXCLUDED.max_users, \
                reservation_ttl_seconds = EXCLUDED.reservation_ttl_seconds, \
                updated_at = NOW() \
             RETURNING *",
        )
        .bind(event_id)
        .bind(max_concurrent)
        .bind(max_users)
        .bind(reservation_ttl_seconds)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert queue config", e))
    }

    /// Delete the queue configuration for an event. Returns whether a row
    /// was removed.
    pub async fn delete(&self, event_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM queue_configs WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete queue config", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// List all configured event queues.
    pub async fn find_all(&self) -> AppResult<Vec<QueueConfig>> {
        sqlx::query_as::<_, QueueConfig>("SELECT * FROM queue_configs ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list queue configs", e)
            })
    }
}
