//! Per-event reconciliation pass: reclaim lapsed slots, promote waiting
//! users, mirror both transitions into the turn ledger.
//!
//! The same pass backs the periodic worker and the on-demand gateway
//! trigger. One event's failure never aborts the others — each event gets
//! its own report.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use turnstile_coordinator::{AdmissionCoordinator, CoordinatorDispatch};
use turnstile_core::result::AppResult;
use turnstile_database::repositories::queue_config::QueueConfigRepository;
use turnstile_database::repositories::turn::TurnRepository;
use turnstile_entity::queue::QueueConfig;

/// Outcome of one event's reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPassReport {
    /// The event that was processed.
    pub event_id: Uuid,
    /// Number of lapsed active slots reclaimed.
    pub reclaimed: u64,
    /// Number of waiting users promoted.
    pub promoted: u64,
    /// The users newly admitted by this pass, in promotion order.
    pub newly_active_user_ids: Vec<Uuid>,
    /// Error message when the pass failed for this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventPassReport {
    fn failed(event_id: Uuid, error: String) -> Self {
        Self {
            event_id,
            reclaimed: 0,
            promoted: 0,
            newly_active_user_ids: Vec::new(),
            error: Some(error),
        }
    }
}

/// Reconciliation service shared by the worker loop and the gateway.
#[derive(Debug, Clone)]
pub struct ReconciliationService {
    /// Admission coordinator (Redis or in-memory).
    coordinator: Arc<CoordinatorDispatch>,
    /// Queue configuration store.
    config_repo: Arc<QueueConfigRepository>,
    /// Turn ledger.
    turn_repo: Arc<TurnRepository>,
}

impl ReconciliationService {
    /// Create a new reconciliation service.
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

    /// Run one reconciliation pass for a single event.
    pub async fn run_event(&self, event_id: Uuid) -> AppResult<EventPassReport> {
        let config = self.config_repo.get_by_event_id(event_id).await?;
        self.run_for_config(&config).await
    }

    /// Run one reconciliation pass for every configured event.
    ///
    /// Events share no ephemeral state, so their passes run concurrently.
    /// A failing event is reported and skipped, never propagated.
    pub async fn run_all(&self) -> AppResult<Vec<EventPassReport>> {
        let configs = self.config_repo.find_all().await?;

        let passes = configs.iter().map(|config| async {
            match self.run_for_config(config).await {
                Ok(report) => report,
                Err(e) => {
                    error!(event_id = %config.event_id, error = %e, "Reconciliation pass failed");
                    EventPassReport::failed(config.event_id, e.to_string())
                }
            }
        });

        Ok(join_all(passes).await)
    }

    /// The pass itself: reclaim, then promote, then mirror.
    async fn run_for_config(&self, config: &QueueConfig) -> AppResult<EventPassReport> {
        let event_id = config.event_id;
        let limits = config.limits();
        let now = Utc::now();

        let reclaimed = self.coordinator.reclaim_expired(event_id, now).await?;
        if !reclaimed.is_empty() {
            if let Err(e) = self.turn_repo.mark_abandoned_many(event_id, &reclaimed).await {
                error!(%event_id, error = %e, "Failed to mirror reclaimed slots into ledger");
            }
        }

        let promoted = self.coordinator.promote(event_id, &limits, now).await?;
        if !promoted.is_empty() {
            if let Err(e) = self
                .turn_repo
                .mark_active_many(event_id, &promoted, now)
                .await
            {
                error!(%event_id, error = %e, "Failed to mirror promotions into ledger");
            }
        }

        if !reclaimed.is_empty() || !promoted.is_empty() {
            info!(
                %event_id,
                reclaimed = reclaimed.len(),
                promoted = promoted.len(),
                "Reconciliation pass applied changes"
            );
        }

        Ok(EventPassReport {
            event_id,
            reclaimed: reclaimed.len() as u64,
            promoted: promoted.len() as u64,
            newly_active_user_ids: promoted,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization_omits_absent_error() {
        let report = EventPassReport {
            event_id: Uuid::nil(),
            reclaimed: 1,
            promoted: 2,
            newly_active_user_ids: vec![Uuid::nil()],
            error: None,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["reclaimed"], 1);
        assert_eq!(json["promoted"], 2);
    }
}
