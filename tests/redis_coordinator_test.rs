//! Integration tests for the Redis admission coordinator.
//!
//! These run against a real Redis instance and are ignored by default:
//!
//! ```sh
//! REDIS_URL=redis://localhost:6379 cargo test -- --ignored
//! ```

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use turnstile_coordinator::redis::RedisCoordinator;
use turnstile_coordinator::{AdmissionCoordinator, JoinOutcome, LeaveOutcome};
use turnstile_core::config::coordinator::RedisCoordinatorConfig;
use turnstile_entity::queue::QueueLimits;

async fn coordinator() -> RedisCoordinator {
    let config = RedisCoordinatorConfig {
        url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        key_prefix: format!("turnstile-test-{}:", Uuid::new_v4()),
    };
    RedisCoordinator::connect(&config)
        .await
        .expect("Redis must be reachable for ignored integration tests")
}

fn limits(max_concurrent: u32, max_users: u32) -> QueueLimits {
    QueueLimits {
        max_concurrent,
        max_users,
        reservation_ttl: Duration::from_secs(60),
    }
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_join_admits_up_to_capacity_then_queues() {
    let coordinator = coordinator().await;
    let event = Uuid::new_v4();
    let limits = limits(2, 10);

    assert_eq!(
        coordinator
            .join(event, Uuid::new_v4(), &limits, Utc::now())
            .await
            .unwrap(),
        JoinOutcome::Admitted
    );
    assert_eq!(
        coordinator
            .join(event, Uuid::new_v4(), &limits, Utc::now())
            .await
            .unwrap(),
        JoinOutcome::Admitted
    );
    assert_eq!(
        coordinator
            .join(event, Uuid::new_v4(), &limits, Utc::now())
            .await
            .unwrap(),
        JoinOutcome::Waiting { position: 1 }
    );
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_join_is_idempotent_and_queue_full_is_reported() {
    let coordinator = coordinator().await;
    let event = Uuid::new_v4();
    let limits = limits(1, 2);
    let buyer = Uuid::new_v4();
    let waiter = Uuid::new_v4();

    assert_eq!(
        coordinator
            .join(event, buyer, &limits, Utc::now())
            .await
            .unwrap(),
        JoinOutcome::Admitted
    );
    assert_eq!(
        coordinator
            .join(event, buyer, &limits, Utc::now())
            .await
            .unwrap(),
        JoinOutcome::Admitted
    );

    assert_eq!(
        coordinator
            .join(event, waiter, &limits, Utc::now())
            .await
            .unwrap(),
        JoinOutcome::Waiting { position: 1 }
    );
    assert_eq!(
        coordinator
            .join(event, Uuid::new_v4(), &limits, Utc::now())
            .await
            .unwrap(),
        JoinOutcome::QueueFull
    );
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_reclaim_then_promote_cycle() {
    let coordinator = coordinator().await;
    let event = Uuid::new_v4();
    let limits = limits(1, 10);
    let expired = Uuid::new_v4();
    let waiting = Uuid::new_v4();

    let t0 = Utc::now();
    coordinator.join(event, expired, &limits, t0).await.unwrap();
    coordinator.join(event, waiting, &limits, t0).await.unwrap();

    let after = t0 + chrono::Duration::seconds(61);
    assert_eq!(
        coordinator.reclaim_expired(event, after).await.unwrap(),
        vec![expired]
    );
    assert!(coordinator
        .reclaim_expired(event, after)
        .await
        .unwrap()
        .is_empty());

    assert_eq!(
        coordinator.promote(event, &limits, after).await.unwrap(),
        vec![waiting]
    );

    let standing = coordinator.position(event, waiting).await.unwrap().unwrap();
    assert!(standing.admitted);
    assert_eq!(standing.position, None);
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_leave_reports_which_side_was_removed() {
    let coordinator = coordinator().await;
    let event = Uuid::new_v4();
    let limits = limits(1, 10);
    let buyer = Uuid::new_v4();
    let waiter = Uuid::new_v4();

    coordinator.join(event, buyer, &limits, Utc::now()).await.unwrap();
    coordinator.join(event, waiter, &limits, Utc::now()).await.unwrap();

    assert_eq!(
        coordinator.leave(event, buyer).await.unwrap(),
        LeaveOutcome::ActiveRemoved
    );
    assert_eq!(
        coordinator.leave(event, waiter).await.unwrap(),
        LeaveOutcome::WaitingRemoved
    );
    assert_eq!(
        coordinator.leave(event, waiter).await.unwrap(),
        LeaveOutcome::NotPresent
    );
}
