//! Periodic reclaim of jobs stuck in Processing.
//!
//! A worker that crashes mid-execution leaves its claimed record in
//! Processing forever; nothing else may touch it because the claim granted
//! exclusivity. This sweep treats any record Processing for longer than the
//! visibility timeout as abandoned and resets it to Pending (charging one
//! attempt), so another worker can pick it up.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use conveyor_store::JobStore;
use tokio_util::sync::CancellationToken;

use crate::metrics::MetricsCounter;

/// How long a record may sit in Processing before it counts as abandoned.
pub const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(600);

/// How often the sweep runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Sweep configuration.
#[derive(Debug, Clone)]
pub struct ReclaimConfig {
    pub visibility_timeout: Duration,
    pub sweep_interval: Duration,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: DEFAULT_VISIBILITY_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Run the reclaim loop until `cancel` is triggered.
///
/// Intended to be spawned via `tokio::spawn`, one instance per process.
pub async fn run(
    store: Arc<dyn JobStore>,
    metrics: Arc<MetricsCounter>,
    config: ReclaimConfig,
    cancel: CancellationToken,
) {
    tracing::info!(
        visibility_timeout_secs = config.visibility_timeout.as_secs(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Reclaimer started",
    );

    let mut interval = tokio::time::interval(config.sweep_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Reclaimer stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now()
                    - chrono::Duration::from_std(config.visibility_timeout)
                        .unwrap_or_else(|_| chrono::Duration::seconds(600));
                match store.reclaim_stuck(cutoff).await {
                    Ok(reclaimed) if reclaimed > 0 => {
                        metrics.record_reclaimed(reclaimed);
                        tracing::warn!(reclaimed, "Reclaimed jobs stuck in Processing");
                    }
                    Ok(_) => {
                        tracing::debug!("No stuck jobs to reclaim");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reclaim sweep failed");
                    }
                }
            }
        }
    }
}
