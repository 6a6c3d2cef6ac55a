//! Reconciliation sweep.
//!
//! Periodic background pass that re-fetches broker-side status for
//! tracked orders stuck in a non-terminal state. This is what guarantees
//! `SubmissionUncertain` never lingers indefinitely: once connectivity
//! returns, the sweep resolves it one way or the other.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::GatewayError;
use crate::application::ports::{BrokerPort, OrderTrackerPort};
use crate::application::services::OrderService;
use crate::domain::shared::Timestamp;

/// Sweep configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often the sweep runs.
    pub interval: Duration,
    /// Minimum age (since last update) before an order is re-checked.
    pub staleness: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            staleness: Duration::from_secs(60),
        }
    }
}

/// Outcome of a single sweep pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepReport {
    /// Stale non-terminal orders examined.
    pub checked: usize,
    /// Orders that reached a terminal state during this pass.
    pub resolved: usize,
    /// Orders whose sync failed (retried on the next pass).
    pub failed: usize,
}

/// Background reconciler for stale non-terminal orders.
pub struct ReconciliationSweep<B, T> {
    service: Arc<OrderService<B, T>>,
    tracker: Arc<T>,
    config: SweepConfig,
}

impl<B, T> ReconciliationSweep<B, T>
where
    B: BrokerPort + 'static,
    T: OrderTrackerPort + 'static,
{
    /// Create a new sweep.
    pub fn new(service: Arc<OrderService<B, T>>, tracker: Arc<T>, config: SweepConfig) -> Self {
        Self {
            service,
            tracker,
            config,
        }
    }

    /// Run one pass over all stale non-terminal orders.
    ///
    /// Failures are isolated per order: one broker error never aborts
    /// the pass.
    pub async fn run_once(&self) -> SweepReport {
        let now = Timestamp::now();
        let staleness = chrono::Duration::from_std(self.config.staleness)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        let mut report = SweepReport::default();

        for order in self.tracker.list_non_terminal().await {
            if now.duration_since(order.updated_at()) < staleness {
                continue;
            }
            report.checked += 1;

            match self.service.sync_status(order.id()).await {
                Ok(updated) => {
                    if updated.is_terminal() {
                        report.resolved += 1;
                    }
                }
                Err(GatewayError::RateLimitTimeout) => {
                    // Expected under load; the next pass retries.
                    tracing::debug!(
                        client_order_id = %order.id(),
                        "Sweep skipped order waiting for rate limiter"
                    );
                    report.failed += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        client_order_id = %order.id(),
                        %error,
                        "Sweep failed to sync order"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Spawn the periodic sweep loop.
    ///
    /// Runs until the token is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // Consume the immediate first tick.
            ticker.tick().await;

            tracing::info!(
                interval_secs = self.config.interval.as_secs(),
                staleness_secs = self.config.staleness.as_secs(),
                "Reconciliation sweep started"
            );

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let report = self.run_once().await;
                        if report.checked > 0 {
                            tracing::info!(
                                checked = report.checked,
                                resolved = report.resolved,
                                failed = report.failed,
                                "Reconciliation sweep pass complete"
                            );
                        }
                    }
                }
            }

            tracing::info!("Reconciliation sweep stopped");
        })
    }
}
