//! Worker runner — ticker loop that drives reconciliation passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing;

use turnstile_core::config::worker::WorkerConfig;
use turnstile_service::ReconciliationService;

/// Periodic reconciliation worker.
///
/// One logical pass per event per tick; different events are processed in
/// parallel by the underlying service since they share no ephemeral state.
/// Multiple worker processes may run concurrently — the coordinator's
/// atomic promotion script keeps them from jointly overshooting capacity.
#[derive(Debug)]
pub struct ReconciliationWorker {
    /// Reconciliation service driving each pass.
    service: Arc<ReconciliationService>,
    /// Worker configuration.
    config: WorkerConfig,
}

impl ReconciliationWorker {
    /// Create a new reconciliation worker.
    pub fn new(service: Arc<ReconciliationService>, config: WorkerConfig) -> Self {
        Self { service, config }
    }

    /// Start the worker — runs until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds.max(1));

        tracing::info!(
            poll_interval_seconds = poll_interval.as_secs(),
            "Reconciliation worker started"
        );

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Reconciliation worker received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(poll_interval) => {
                    self.tick().await;
                }
            }
        }

        tracing::info!("Reconciliation worker shut down");
    }

    /// Run one reconciliation pass over all configured events.
    async fn tick(&self) {
        match self.service.run_all().await {
            Ok(reports) => {
                let reclaimed: u64 = reports.iter().map(|r| r.reclaimed).sum();
                let promoted: u64 = reports.iter().map(|r| r.promoted).sum();
                let failed = reports.iter().filter(|r| r.error.is_some()).count();

                if reclaimed > 0 || promoted > 0 || failed > 0 {
                    tracing::info!(
                        events = reports.len(),
                        reclaimed,
                        promoted,
                        failed,
                        "Reconciliation tick complete"
                    );
                } else {
                    tracing::trace!(events = reports.len(), "Reconciliation tick: no changes");
                }
            }
            Err(e) => {
                // Config-store outage: skip the tick, keep the loop alive.
                tracing::error!(error = %e, "Reconciliation tick failed");
            }
        }
    }
}
