//! Worker host configuration, loaded from environment variables.

use std::time::Duration;

/// Default number of concurrent worker loops.
const DEFAULT_WORKER_COUNT: usize = 4;

/// Default idle wait between empty claims, in milliseconds.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default visibility timeout for stuck Processing records, in seconds.
const DEFAULT_VISIBILITY_TIMEOUT_SECS: u64 = 600;

/// Default interval between reclaim sweeps, in seconds.
const DEFAULT_RECLAIM_INTERVAL_SECS: u64 = 30;

/// Runtime configuration for the worker host.
///
/// | Variable                  | Required | Default |
/// |---------------------------|----------|---------|
/// | `DATABASE_URL`            | yes      | —       |
/// | `WORKER_COUNT`            | no       | `4`     |
/// | `POLL_INTERVAL_MS`        | no       | `1000`  |
/// | `VISIBILITY_TIMEOUT_SECS` | no       | `600`   |
/// | `RECLAIM_INTERVAL_SECS`   | no       | `30`    |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Postgres connection string for the job store.
    pub database_url: String,
    /// Number of concurrent claim-and-execute loops.
    pub worker_count: usize,
    /// Idle wait between unsuccessful claim attempts.
    pub poll_interval: Duration,
    /// How long a Processing record may go without an update before the
    /// reclaimer treats it as abandoned.
    pub visibility_timeout: Duration,
    /// How often the reclaim sweep runs.
    pub reclaim_interval: Duration,
}

impl WorkerConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        Ok(Self {
            database_url,
            worker_count: env_or("WORKER_COUNT", DEFAULT_WORKER_COUNT),
            poll_interval: Duration::from_millis(env_or(
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )),
            visibility_timeout: Duration::from_secs(env_or(
                "VISIBILITY_TIMEOUT_SECS",
                DEFAULT_VISIBILITY_TIMEOUT_SECS,
            )),
            reclaim_interval: Duration::from_secs(env_or(
                "RECLAIM_INTERVAL_SECS",
                DEFAULT_RECLAIM_INTERVAL_SECS,
            )),
        })
    }
}

/// Read and parse an environment variable, falling back to `default` when it
/// is unset or unparseable.
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment access is process-global, so the branches share one test
    // instead of racing each other across threads.
    #[test]
    fn from_env_covers_missing_set_and_default_values() {
        std::env::remove_var("DATABASE_URL");
        assert!(WorkerConfig::from_env().is_err());

        std::env::set_var("DATABASE_URL", "postgres://localhost/conveyor");
        std::env::set_var("WORKER_COUNT", "8");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.visibility_timeout, Duration::from_secs(600));
        assert_eq!(config.reclaim_interval, Duration::from_secs(30));

        std::env::set_var("WORKER_COUNT", "not-a-number");
        let config = WorkerConfig::from_env().unwrap();
        assert_eq!(config.worker_count, DEFAULT_WORKER_COUNT);

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("WORKER_COUNT");
    }
}
