//! Worker host: wires the engine to the Postgres store and supervises the
//! worker loops.
//!
//! Bootstrap is two-phase by construction: the handler registry is built and
//! frozen before the first worker loop starts, so registration never races
//! with polling.

pub mod config;
pub mod handlers;

use std::sync::Arc;

use conveyor_engine::reclaim::{self, ReclaimConfig};
use conveyor_engine::{Dispatcher, HandlerRegistry, MetricsCounter, Worker};
use conveyor_store::{JobStore, PostgresStore};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

/// Extra pool connections beyond one per worker loop (reclaimer + producers).
const POOL_HEADROOM: u32 = 2;

/// Run the worker host until a shutdown signal arrives.
pub async fn run(config: WorkerConfig) -> anyhow::Result<()> {
    // Phase 1: registry. Complete before anything can poll.
    let mut registry = HandlerRegistry::new();
    handlers::register_all(&mut registry);
    tracing::info!(job_types = ?registry.job_types(), "Handler registry built");
    let registry = Arc::new(registry);

    // Store and engine plumbing.
    let pool = PgPoolOptions::new()
        .max_connections(config.worker_count as u32 + POOL_HEADROOM)
        .connect(&config.database_url)
        .await?;
    let postgres = PostgresStore::new(pool);
    postgres.migrate().await?;
    let store: Arc<dyn JobStore> = Arc::new(postgres);

    let metrics = Arc::new(MetricsCounter::new());
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        registry,
        metrics.clone(),
    ));

    // Phase 2: worker loops and the reclaimer, all on one token.
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    for worker_id in 0..config.worker_count {
        let worker = Worker::new(
            worker_id,
            store.clone(),
            dispatcher.clone(),
            metrics.clone(),
        )
        .with_poll_interval(config.poll_interval);
        let cancel = cancel.clone();
        tasks.push(tokio::spawn(async move { worker.run(cancel).await }));
    }

    tasks.push(tokio::spawn(reclaim::run(
        store.clone(),
        metrics.clone(),
        ReclaimConfig {
            visibility_timeout: config.visibility_timeout,
            sweep_interval: config.reclaim_interval,
        },
        cancel.clone(),
    )));

    tracing::info!(
        worker_count = config.worker_count,
        "Worker host running, press Ctrl-C to stop",
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, draining in-flight jobs");
    cancel.cancel();

    for task in tasks {
        // A panicked task already logged through the panic hook; shutdown
        // should still complete for the rest.
        let _ = task.await;
    }

    tracing::info!(metrics = ?metrics.snapshot(), "Worker host stopped");
    Ok(())
}
