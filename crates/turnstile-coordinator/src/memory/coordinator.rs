//! In-memory admission coordinator using a Tokio mutex.
//!
//! Single-node deployments and tests only. One mutex guards all events,
//! which serializes every capacity-changing operation — the same guarantee
//! the Redis implementation gets from server-side scripts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use turnstile_core::result::AppResult;
use turnstile_entity::queue::QueueLimits;

use crate::coordinator::{
    AdmissionCoordinator, JoinOutcome, LeaveOutcome, QueueCounts, QueuePosition,
};

/// Per-event ephemeral queue state.
#[derive(Debug, Default)]
struct EventQueue {
    /// Waiting users in FIFO order.
    waiting: Vec<Uuid>,
    /// Active users mapped to their expiry deadline (ms).
    active: HashMap<Uuid, i64>,
}

/// In-memory admission coordinator.
#[derive(Debug, Clone, Default)]
pub struct MemoryCoordinator {
    /// Protected per-event state.
    state: Arc<Mutex<HashMap<Uuid, EventQueue>>>,
}

impl MemoryCoordinator {
    /// Create a new empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdmissionCoordinator for MemoryCoordinator {
    async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<JoinOutcome> {
        let mut state = self.state.lock().await;
        let queue = state.entry(event_id).or_default();

        // Idempotent for users already present
        if queue.active.contains_key(&user_id) {
            return Ok(JoinOutcome::Admitted);
        }
        if let Some(rank) = queue.waiting.iter().position(|u| *u == user_id) {
            return Ok(JoinOutcome::Waiting {
                position: rank as u64 + 1,
            });
        }

        if (queue.active.len() as u32) < limits.max_concurrent {
            let deadline = now.timestamp_millis() + limits.reservation_ttl.as_millis() as i64;
            queue.active.insert(user_id, deadline);
            debug!(%event_id, %user_id, "User admitted");
            return Ok(JoinOutcome::Admitted);
        }

        if (queue.active.len() + queue.waiting.len()) as u32 >= limits.max_users {
            return Ok(JoinOutcome::QueueFull);
        }

        queue.waiting.push(user_id);
        Ok(JoinOutcome::Waiting {
            position: queue.waiting.len() as u64,
        })
    }

    async fn position(&self, event_id: Uuid, user_id: Uuid) -> AppResult<Option<QueuePosition>> {
        let state = self.state.lock().await;
        let Some(queue) = state.get(&event_id) else {
            return Ok(None);
        };

        let admitted = queue.active.contains_key(&user_id);
        let rank = queue.waiting.iter().position(|u| *u == user_id);

        if !admitted && rank.is_none() {
            return Ok(None);
        }

        Ok(Some(QueuePosition {
            admitted,
            position: rank.map(|r| r as u64 + 1),
            total_waiting: queue.waiting.len() as u64,
            total_active: queue.active.len() as u64,
        }))
    }

    async fn leave(&self, event_id: Uuid, user_id: Uuid) -> AppResult<LeaveOutcome> {
        let mut state = self.state.lock().await;
        let Some(queue) = state.get_mut(&event_id) else {
            return Ok(LeaveOutcome::NotPresent);
        };

        if queue.active.remove(&user_id).is_some() {
            return Ok(LeaveOutcome::ActiveRemoved);
        }
        if let Some(rank) = queue.waiting.iter().position(|u| *u == user_id) {
            queue.waiting.remove(rank);
            return Ok(LeaveOutcome::WaitingRemoved);
        }
        Ok(LeaveOutcome::NotPresent)
    }

    async fn complete(&self, event_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(queue) = state.get_mut(&event_id) else {
            return Ok(false);
        };
        Ok(queue.active.remove(&user_id).is_some())
    }

    async fn reclaim_expired(&self, event_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
        let mut state = self.state.lock().await;
        let Some(queue) = state.get_mut(&event_id) else {
            return Ok(Vec::new());
        };

        let now_ms = now.timestamp_millis();
        let mut expired: Vec<(i64, Uuid)> = queue
            .active
            .iter()
            .filter(|(_, deadline)| **deadline <= now_ms)
            .map(|(user, deadline)| (*deadline, *user))
            .collect();
        expired.sort();

        for (_, user) in &expired {
            queue.active.remove(user);
        }

        Ok(expired.into_iter().map(|(_, user)| user).collect())
    }

    async fn promote(
        &self,
        event_id: Uuid,
        limits: &QueueLimits,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        let mut state = self.state.lock().await;
        let Some(queue) = state.get_mut(&event_id) else {
            return Ok(Vec::new());
        };

        let free = (limits.max_concurrent as usize).saturating_sub(queue.active.len());
        if free == 0 {
            return Ok(Vec::new());
        }

        let take = free.min(queue.waiting.len());
        let promoted: Vec<Uuid> = queue.waiting.drain(..take).collect();
        let deadline = now.timestamp_millis() + limits.reservation_ttl.as_millis() as i64;
        for user in &promoted {
            queue.active.insert(*user, deadline);
        }

        Ok(promoted)
    }

    async fn counts(&self, event_id: Uuid) -> AppResult<QueueCounts> {
        let state = self.state.lock().await;
        let (waiting, active) = state
            .get(&event_id)
            .map(|q| (q.waiting.len() as u64, q.active.len() as u64))
            .unwrap_or((0, 0));
        Ok(QueueCounts { waiting, active })
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limits(max_concurrent: u32, max_users: u32) -> QueueLimits {
        QueueLimits {
            max_concurrent,
            max_users,
            reservation_ttl: Duration::from_secs(300),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[tokio::test]
    async fn test_first_users_admitted_up_to_capacity() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = limits(2, 100);

        for _ in 0..2 {
            let outcome = coordinator
                .join(event, Uuid::new_v4(), &limits, now())
                .await
                .unwrap();
            assert_eq!(outcome, JoinOutcome::Admitted);
        }

        let outcome = coordinator
            .join(event, Uuid::new_v4(), &limits, now())
            .await
            .unwrap();
        assert_eq!(outcome, JoinOutcome::Waiting { position: 1 });
    }

    #[tokio::test]
    async fn test_capacity_invariant_under_concurrent_joins() {
        let coordinator = Arc::new(MemoryCoordinator::new());
        let event = Uuid::new_v4();
        let limits = limits(3, 1000);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let limits = limits;
                tokio::spawn(async move {
                    coordinator
                        .join(event, Uuid::new_v4(), &limits, Utc::now())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() == JoinOutcome::Admitted {
                admitted += 1;
            }
        }

        let counts = coordinator.counts(event).await.unwrap();
        assert_eq!(admitted, 3);
        assert_eq!(counts.active, 3);
        assert_eq!(counts.waiting, 47);
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = limits(1, 100);
        let active_user = Uuid::new_v4();
        let waiting_user = Uuid::new_v4();

        assert_eq!(
            coordinator
                .join(event, active_user, &limits, now())
                .await
                .unwrap(),
            JoinOutcome::Admitted
        );
        assert_eq!(
            coordinator
                .join(event, active_user, &limits, now())
                .await
                .unwrap(),
            JoinOutcome::Admitted
        );

        assert_eq!(
            coordinator
                .join(event, waiting_user, &limits, now())
                .await
                .unwrap(),
            JoinOutcome::Waiting { position: 1 }
        );
        assert_eq!(
            coordinator
                .join(event, waiting_user, &limits, now())
                .await
                .unwrap(),
            JoinOutcome::Waiting { position: 1 }
        );

        let counts = coordinator.counts(event).await.unwrap();
        assert_eq!(counts.active, 1);
        assert_eq!(counts.waiting, 1);
    }

    #[tokio::test]
    async fn test_queue_full_refuses_join() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = limits(1, 2);

        assert_eq!(
            coordinator
                .join(event, Uuid::new_v4(), &limits, now())
                .await
                .unwrap(),
            JoinOutcome::Admitted
        );
        assert_eq!(
            coordinator
                .join(event, Uuid::new_v4(), &limits, now())
                .await
                .unwrap(),
            JoinOutcome::Waiting { position: 1 }
        );
        assert_eq!(
            coordinator
                .join(event, Uuid::new_v4(), &limits, now())
                .await
                .unwrap(),
            JoinOutcome::QueueFull
        );
    }

    #[tokio::test]
    async fn test_single_slot_queue_walkthrough() {
        // max_concurrent=1: U1 admitted, U2 and U3 queue in order; after U1
        // leaves, one worker promotion admits U2 and U3 moves up.
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = limits(1, 100);
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(
            coordinator.join(event, u1, &limits, now()).await.unwrap(),
            JoinOutcome::Admitted
        );
        assert_eq!(
            coordinator.join(event, u2, &limits, now()).await.unwrap(),
            JoinOutcome::Waiting { position: 1 }
        );
        assert_eq!(
            coordinator.join(event, u3, &limits, now()).await.unwrap(),
            JoinOutcome::Waiting { position: 2 }
        );

        assert_eq!(
            coordinator.leave(event, u1).await.unwrap(),
            LeaveOutcome::ActiveRemoved
        );
        // Leave frees capacity but never promotes by itself
        let counts = coordinator.counts(event).await.unwrap();
        assert_eq!(counts.active, 0);
        assert_eq!(counts.waiting, 2);

        let promoted = coordinator.promote(event, &limits, now()).await.unwrap();
        assert_eq!(promoted, vec![u2]);

        let u2_position = coordinator.position(event, u2).await.unwrap().unwrap();
        assert!(u2_position.admitted);
        assert_eq!(u2_position.position, None);

        let u3_position = coordinator.position(event, u3).await.unwrap().unwrap();
        assert!(!u3_position.admitted);
        assert_eq!(u3_position.position, Some(1));
    }

    #[tokio::test]
    async fn test_fifo_order_survives_mid_queue_leave() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = limits(1, 100);
        let users: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        coordinator
            .join(event, users[0], &limits, now())
            .await
            .unwrap();
        for user in &users[1..] {
            coordinator.join(event, *user, &limits, now()).await.unwrap();
        }

        // users[2] gives up; users[1] and users[3] keep their relative order
        coordinator.leave(event, users[2]).await.unwrap();

        let p1 = coordinator.position(event, users[1]).await.unwrap().unwrap();
        let p3 = coordinator.position(event, users[3]).await.unwrap().unwrap();
        assert_eq!(p1.position, Some(1));
        assert_eq!(p3.position, Some(2));
    }

    #[tokio::test]
    async fn test_reclaim_is_exactly_once() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = QueueLimits {
            max_concurrent: 2,
            max_users: 100,
            reservation_ttl: Duration::from_secs(60),
        };
        let user = Uuid::new_v4();

        let t0 = now();
        coordinator.join(event, user, &limits, t0).await.unwrap();

        let after_expiry = t0 + chrono::Duration::seconds(61);
        let first = coordinator
            .reclaim_expired(event, after_expiry)
            .await
            .unwrap();
        assert_eq!(first, vec![user]);

        let second = coordinator
            .reclaim_expired(event, after_expiry)
            .await
            .unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_reclaim_leaves_live_slots_alone() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = QueueLimits {
            max_concurrent: 2,
            max_users: 100,
            reservation_ttl: Duration::from_secs(60),
        };

        let t0 = now();
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        coordinator.join(event, stale, &limits, t0).await.unwrap();
        coordinator
            .join(event, fresh, &limits, t0 + chrono::Duration::seconds(45))
            .await
            .unwrap();

        let reclaimed = coordinator
            .reclaim_expired(event, t0 + chrono::Duration::seconds(61))
            .await
            .unwrap();
        assert_eq!(reclaimed, vec![stale]);

        let counts = coordinator.counts(event).await.unwrap();
        assert_eq!(counts.active, 1);
    }

    #[tokio::test]
    async fn test_promotion_after_reclaim_fills_exactly_freed_slots() {
        // max_concurrent=2, two active, one waiting: reclaiming one slot
        // must promote exactly the waiting user and no more.
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = QueueLimits {
            max_concurrent: 2,
            max_users: 100,
            reservation_ttl: Duration::from_secs(60),
        };

        let t0 = now();
        let expiring = Uuid::new_v4();
        let staying = Uuid::new_v4();
        let waiting = Uuid::new_v4();
        coordinator.join(event, expiring, &limits, t0).await.unwrap();
        coordinator
            .join(event, staying, &limits, t0 + chrono::Duration::seconds(30))
            .await
            .unwrap();
        coordinator
            .join(event, waiting, &limits, t0 + chrono::Duration::seconds(31))
            .await
            .unwrap();

        let pass_time = t0 + chrono::Duration::seconds(61);
        let reclaimed = coordinator.reclaim_expired(event, pass_time).await.unwrap();
        assert_eq!(reclaimed, vec![expiring]);

        let promoted = coordinator.promote(event, &limits, pass_time).await.unwrap();
        assert_eq!(promoted, vec![waiting]);

        let counts = coordinator.counts(event).await.unwrap();
        assert_eq!(counts.active, 2);
        assert_eq!(counts.waiting, 0);
    }

    #[tokio::test]
    async fn test_promote_respects_fifo_across_rounds() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = limits(1, 100);
        let holder = Uuid::new_v4();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

        coordinator.join(event, holder, &limits, now()).await.unwrap();
        coordinator.join(event, first, &limits, now()).await.unwrap();
        coordinator
            .join(event, second, &limits, now())
            .await
            .unwrap();

        // No free slot: promotion is a no-op
        assert!(coordinator
            .promote(event, &limits, now())
            .await
            .unwrap()
            .is_empty());

        // Free one slot at a time; arrival order must be preserved
        assert!(coordinator.complete(event, holder).await.unwrap());
        assert_eq!(
            coordinator.promote(event, &limits, now()).await.unwrap(),
            vec![first]
        );

        assert!(coordinator.complete(event, first).await.unwrap());
        assert_eq!(
            coordinator.promote(event, &limits, now()).await.unwrap(),
            vec![second]
        );
    }

    #[tokio::test]
    async fn test_complete_frees_capacity_without_promotion() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        let limits = limits(1, 100);
        let buyer = Uuid::new_v4();
        let waiting = Uuid::new_v4();

        coordinator.join(event, buyer, &limits, now()).await.unwrap();
        coordinator
            .join(event, waiting, &limits, now())
            .await
            .unwrap();

        assert!(coordinator.complete(event, buyer).await.unwrap());
        // Completing twice reports false
        assert!(!coordinator.complete(event, buyer).await.unwrap());

        let counts = coordinator.counts(event).await.unwrap();
        assert_eq!(counts.active, 0);
        assert_eq!(counts.waiting, 1);
    }

    #[tokio::test]
    async fn test_position_unknown_user_is_none() {
        let coordinator = MemoryCoordinator::new();
        let event = Uuid::new_v4();
        assert!(coordinator
            .position(event, Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_events_are_isolated() {
        let coordinator = MemoryCoordinator::new();
        let limits = limits(1, 100);
        let (event_a, event_b) = (Uuid::new_v4(), Uuid::new_v4());
        let user = Uuid::new_v4();

        // The same user can hold slots in two different events
        assert_eq!(
            coordinator.join(event_a, user, &limits, now()).await.unwrap(),
            JoinOutcome::Admitted
        );
        assert_eq!(
            coordinator.join(event_b, user, &limits, now()).await.unwrap(),
            JoinOutcome::Admitted
        );

        coordinator.leave(event_a, user).await.unwrap();
        assert!(coordinator.position(event_b, user).await.unwrap().is_some());
    }
}
