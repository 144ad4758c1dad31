//! Redis-based admission coordinator using Lua scripts for atomicity.
//!
//! Suitable for multi-node deployments: every capacity-changing operation
//! is a single server-side script, so concurrent gateways and workers can
//! never jointly overshoot an event's capacity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use tracing::{debug, warn};
use uuid::Uuid;

use turnstile_core::config::coordinator::RedisCoordinatorConfig;
use turnstile_core::error::{AppError, ErrorKind};
use turnstile_core::result::AppResult;
use turnstile_entity::queue::QueueLimits;

use crate::coordinator::{
    AdmissionCoordinator, JoinOutcome, LeaveOutcome, QueueCounts, QueuePosition,
};
use crate::keys;

use super::client::RedisClient;

/// Lua script for atomic join-admit-or-wait.
///
/// KEYS[1] = active zset (score = expiry deadline ms)
/// KEYS[2] = waiting zset (score = enqueue time ms)
/// KEYS[3] = reservation key for this user
/// ARGV[1] = user_id
/// ARGV[2] = max_concurrent
/// ARGV[3] = max_users
/// ARGV[4] = reservation TTL seconds
/// ARGV[5] = now (ms)
///
/// Returns {1, 0} admitted, {0, position} waiting, {-1, 0} queue full.
const JOIN_SCRIPT: &str = r#"
    local active_key = KEYS[1]
    local waiting_key = KEYS[2]
    local rsv_key = KEYS[3]
    local user_id = ARGV[1]
    local max_concurrent = tonumber(ARGV[2])
    local max_users = tonumber(ARGV[3])
    local ttl = tonumber(ARGV[4])
    local now_ms = tonumber(ARGV[5])

    -- Already admitted (idempotent)
    if redis.call('ZSCORE', active_key, user_id) then
        return {1, 0}
    end

    -- Already waiting (idempotent)
    local rank = redis.call('ZRANK', waiting_key, user_id)
    if rank then
        return {0, rank + 1}
    end

    local active_count = redis.call('ZCARD', active_key)
    if active_count < max_concurrent then
        redis.call('ZADD', active_key, now_ms + ttl * 1000, user_id)
        redis.call('SET', rsv_key, now_ms, 'EX', ttl)
        return {1, 0}
    end

    local waiting_count = redis.call('ZCARD', waiting_key)
    if active_count + waiting_count >= max_users then
        return {-1, 0}
    end

    redis.call('ZADD', waiting_key, now_ms, user_id)
    return {0, redis.call('ZRANK', waiting_key, user_id) + 1}
"#;

/// Lua script for atomic leave.
///
/// KEYS[1] = active zset, KEYS[2] = waiting zset, KEYS[3] = reservation key
/// ARGV[1] = user_id
///
/// Returns 1 if an active slot was removed, 2 if a waiting entry was
/// removed, 0 if the user was in neither.
const LEAVE_SCRIPT: &str = r#"
    local removed_active = redis.call('ZREM', KEYS[1], ARGV[1])
    local removed_waiting = redis.call('ZREM', KEYS[2], ARGV[1])
    redis.call('DEL', KEYS[3])
    if removed_active == 1 then
        return 1
    end
    if removed_waiting == 1 then
        return 2
    end
    return 0
"#;

/// Lua script for checkout completion.
///
/// KEYS[1] = active zset, KEYS[2] = reservation key
/// ARGV[1] = user_id
///
/// Requires a live reservation: a lapsed window belongs to reclamation.
const COMPLETE_SCRIPT: &str = r#"
    if redis.call('EXISTS', KEYS[2]) == 0 then
        return 0
    end
    redis.call('ZREM', KEYS[1], ARGV[1])
    redis.call('DEL', KEYS[2])
    return 1
"#;

/// Lua script for reclaiming lapsed active slots.
///
/// KEYS[1] = active zset
/// ARGV[1] = now (ms)
/// ARGV[2] = reservation key prefix for the event
///
/// Returns the reclaimed user ids, oldest expiry first.
const RECLAIM_SCRIPT: &str = r#"
    local expired = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1])
    for i = 1, #expired do
        redis.call('ZREM', KEYS[1], expired[i])
        redis.call('DEL', ARGV[2] .. expired[i])
    end
    return expired
"#;

/// Lua script for promoting waiting users into free slots.
///
/// KEYS[1] = active zset, KEYS[2] = waiting zset
/// ARGV[1] = max_concurrent
/// ARGV[2] = reservation TTL seconds
/// ARGV[3] = now (ms)
/// ARGV[4] = reservation key prefix for the event
///
/// Returns the newly admitted user ids in waiting order.
const PROMOTE_SCRIPT: &str = r#"
    local free = tonumber(ARGV[1]) - redis.call('ZCARD', KEYS[1])
    if free <= 0 then
        return {}
    end

    local promoted = redis.call('ZRANGE', KEYS[2], 0, free - 1)
    local ttl = tonumber(ARGV[2])
    local now_ms = tonumber(ARGV[3])

    for i = 1, #promoted do
        local user_id = promoted[i]
        redis.call('ZREM', KEYS[2], user_id)
        redis.call('ZADD', KEYS[1], now_ms + ttl * 1000, user_id)
        redis.call('SET', ARGV[4] .. user_id, now_ms, 'EX', ttl)
    end

    return promoted
"#;

/// Redis-based admission coordinator for multi-node deployments.
#[derive(Debug, Clone)]
pub struct RedisCoordinator {
    /// Redis client with key prefixing.
    client: RedisClient,
}

impl RedisCoordinator {
    /// Connect a new Redis-based coordinator.
    pub async fn connect(config: &RedisCoordinatorConfig) -> AppResult<Self> {
        let client = RedisClient::connect(config).await?;
        Ok(Self { client })
    }

    /// Create a coordinator from an existing client (for tests).
    pub fn from_client(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to an AppError. All Redis failures surface as
    /// coordinator-unavailable: admission fails closed.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Coordinator, format!("Redis error: {e}"), e)
    }

    fn parse_user_ids(raw: Vec<String>) -> AppResult<Vec<Uuid>> {
        raw.iter()
            .map(|s| {
                Uuid::parse_str(s).map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Coordinator,
                        format!("Malformed user id in coordinator state: '{s}'"),
                        e,
                    )
                })
            })
            .collect()
    }
}

#[async_trait]
impl AdmissionCoordinator for RedisCoordinator {
    async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<JoinOutcome> {
        let mut conn = self.client.conn_mut();

        let result: Vec<i64> = redis::Script::new(JOIN_SCRIPT)
            .key(self.client.prefixed_key(&keys::active(event_id)))
            .key(self.client.prefixed_key(&keys::waiting(event_id)))
            .key(self.client.prefixed_key(&keys::reservation(event_id, user_id)))
            .arg(user_id.to_string())
            .arg(limits.max_concurrent)
            .arg(limits.max_users)
            .arg(limits.reservation_ttl.as_secs())
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        match result.as_slice() {
            [1, _] => {
                debug!(%event_id, %user_id, "User admitted");
                Ok(JoinOutcome::Admitted)
            }
            [0, position] => {
                debug!(%event_id, %user_id, position, "User waiting");
                Ok(JoinOutcome::Waiting {
                    position: *position as u64,
                })
            }
            [-1, _] => {
                warn!(%event_id, %user_id, "Join refused: queue at max_users");
                Ok(JoinOutcome::QueueFull)
            }
            other => Err(AppError::coordinator(format!(
                "Unexpected join script result: {other:?}"
            ))),
        }
    }

    async fn position(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<QueuePosition>> {
        let mut conn = self.client.conn_mut();
        let active_key = self.client.prefixed_key(&keys::active(event_id));
        let waiting_key = self.client.prefixed_key(&keys::waiting(event_id));
        let member = user_id.to_string();

        let active_score: Option<f64> = conn
            .zscore(&active_key, &member)
            .await
            .map_err(Self::map_err)?;
        let rank: Option<i64> = conn
            .zrank(&waiting_key, &member)
            .await
            .map_err(Self::map_err)?;

        if active_score.is_none() && rank.is_none() {
            return Ok(None);
        }

        let total_active: u64 = conn.zcard(&active_key).await.map_err(Self::map_err)?;
        let total_waiting: u64 = conn.zcard(&waiting_key).await.map_err(Self::map_err)?;

        Ok(Some(QueuePosition {
            admitted: active_score.is_some(),
            position: rank.map(|r| r as u64 + 1),
            total_waiting,
            total_active,
        }))
    }

    async fn leave(&self, event_id: Uuid, user_id: Uuid) -> AppResult<LeaveOutcome> {
        let mut conn = self.client.conn_mut();

        let result: i64 = redis::Script::new(LEAVE_SCRIPT)
            .key(self.client.prefixed_key(&keys::active(event_id)))
            .key(self.client.prefixed_key(&keys::waiting(event_id)))
            .key(self.client.prefixed_key(&keys::reservation(event_id, user_id)))
            .arg(user_id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        match result {
            1 => Ok(LeaveOutcome::ActiveRemoved),
            2 => Ok(LeaveOutcome::WaitingRemoved),
            0 => Ok(LeaveOutcome::NotPresent),
            other => Err(AppError::coordinator(format!(
                "Unexpected leave script result: {other}"
            ))),
        }
    }

    async fn complete(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();

        let result: i64 = redis::Script::new(COMPLETE_SCRIPT)
            .key(self.client.prefixed_key(&keys::active(event_id)))
            .key(self.client.prefixed_key(&keys::reservation(event_id, user_id)))
            .arg(user_id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(result == 1)
    }

    async fn reclaim_expired(&self, event_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let mut conn = self.client.conn_mut();

        let reclaimed: Vec<String> = redis::Script::new(RECLAIM_SCRIPT)
            .key(self.client.prefixed_key(&keys::active(event_id)))
            .arg(now.timestamp_millis())
            .arg(self.client.prefixed_key(&keys::reservation_prefix(event_id)))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        if !reclaimed.is_empty() {
            debug!(%event_id, count = reclaimed.len(), "Reclaimed lapsed active slots");
        }

        Self::parse_user_ids(reclaimed)
    }

    async fn promote(
        &self,
        event_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        let mut conn = self.client.conn_mut();

        let promoted: Vec<String> = redis::Script::new(PROMOTE_SCRIPT)
            .key(self.client.prefixed_key(&keys::active(event_id)))
            .key(self.client.prefixed_key(&keys::waiting(event_id)))
            .arg(limits.max_concurrent)
            .arg(limits.reservation_ttl.as_secs())
            .arg(now.timestamp_millis())
            .arg(self.client.prefixed_key(&keys::reservation_prefix(event_id)))
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        if !promoted.is_empty() {
            debug!(%event_id, count = promoted.len(), "Promoted waiting users");
        }

        Self::parse_user_ids(promoted)
    }

    async fn counts(&self, event_id: Uuid) -> AppResult<QueueCounts> {
        let mut conn = self.client.conn_mut();

        let waiting: u64 = conn
            .zcard(self.client.prefixed_key(&keys::waiting(event_id)))
            .await
            .map_err(Self::map_err)?;
        let active: u64 = conn
            .zcard(self.client.prefixed_key(&keys::active(event_id)))
            .await
            .map_err(Self::map_err)?;

        Ok(QueueCounts { waiting, active })
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.client.conn_mut();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }
}
