//! Background worker: the claim-and-execute polling loop.
//!
//! Each worker processes one job at a time; horizontal throughput comes from
//! running multiple workers (in this process or others) against the same
//! store. The loop's only suspension points are the idle wait between empty
//! claims and the handler invocation itself.

use std::sync::Arc;
use std::time::Duration;

use conveyor_store::JobStore;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;
use crate::metrics::MetricsCounter;

/// Default idle wait between unsuccessful claim attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A single claim-and-execute loop.
pub struct Worker {
    id: usize,
    store: Arc<dyn JobStore>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<MetricsCounter>,
    poll_interval: Duration,
}

impl Worker {
    /// Create a worker with the default 1-second poll interval.
    pub fn new(
        id: usize,
        store: Arc<dyn JobStore>,
        dispatcher: Arc<Dispatcher>,
        metrics: Arc<MetricsCounter>,
    ) -> Self {
        Self {
            id,
            store,
            dispatcher,
            metrics,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the idle wait between empty claims.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the loop until `cancel` is triggered.
    ///
    /// Shutdown is observed only between jobs: an in-flight execute always
    /// finishes (the handler receives the cancellation signal through its
    /// context and is expected to wind down on its own).
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            worker_id = self.id,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Worker started",
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.store.claim_next().await {
                Ok(Some(job)) => {
                    self.metrics.record_claimed();
                    tracing::info!(
                        worker_id = self.id,
                        job_id = %job.id,
                        job_type = %job.job_type,
                        attempt = job.attempt,
                        "Job claimed",
                    );
                    if let Err(e) = self.dispatcher.execute(job, cancel.child_token()).await {
                        // Finalization failed (store unavailable mid-flight);
                        // the record stays Processing for the reclaimer.
                        tracing::error!(
                            worker_id = self.id,
                            error = %e,
                            "Failed to persist job outcome",
                        );
                    }
                }
                Ok(None) => self.idle(&cancel).await,
                Err(e) => {
                    // Transient infrastructure failure must not kill the
                    // loop; back off and try again.
                    tracing::error!(
                        worker_id = self.id,
                        error = %e,
                        "Claim failed, backing off",
                    );
                    self.idle(&cancel).await;
                }
            }
        }

        tracing::info!(worker_id = self.id, "Worker stopped");
    }

    /// Wait out the poll interval, or return early on shutdown.
    async fn idle(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.poll_interval) => {}
        }
    }
}
