//! Job dispatcher: turns enqueue/schedule requests into persisted records,
//! and claimed records back into handler invocations.
//!
//! The dispatcher owns the retry policy. On failure it records the error,
//! then either reschedules the job with exponential backoff or, once the
//! attempt budget is spent (or the failure is permanent), moves it to Dead.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use conveyor_core::backoff;
use conveyor_core::types::{JobId, Timestamp};
use conveyor_store::models::{JobRecord, NewJob};
use conveyor_store::{JobStore, StoreError};
use tokio_util::sync::CancellationToken;

use crate::error::{EnqueueError, ExecuteError};
use crate::metrics::MetricsCounter;
use crate::registry::{HandlerRegistry, JobContext};

/// Builds job records for producers and executes claimed records.
pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    registry: Arc<HandlerRegistry>,
    metrics: Arc<MetricsCounter>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<HandlerRegistry>,
        metrics: Arc<MetricsCounter>,
    ) -> Self {
        Self {
            store,
            registry,
            metrics,
        }
    }

    /// Counters shared with this dispatcher.
    pub fn metrics(&self) -> &Arc<MetricsCounter> {
        &self.metrics
    }

    // -----------------------------------------------------------------------
    // Producer side
    // -----------------------------------------------------------------------

    /// Persist a job that is due immediately. Returns its identifier.
    pub async fn enqueue(&self, input: NewJob) -> Result<JobId, EnqueueError> {
        self.submit(input, None).await
    }

    /// Persist a job that becomes due after `delay`.
    pub async fn schedule(&self, input: NewJob, delay: Duration) -> Result<JobId, EnqueueError> {
        let delay = chrono::Duration::from_std(delay)
            .map_err(|_| EnqueueError::Invalid(format!("delay out of range: {delay:?}")))?;
        self.submit(input, Some(Utc::now() + delay)).await
    }

    async fn submit(
        &self,
        input: NewJob,
        scheduled_at: Option<Timestamp>,
    ) -> Result<JobId, EnqueueError> {
        input.validate().map_err(EnqueueError::Invalid)?;

        // Fail fast: a missing registration would otherwise only surface
        // asynchronously, as a Dead record.
        if !self.registry.contains(&input.job_type) {
            return Err(EnqueueError::UnknownHandler(input.job_type));
        }

        let record = JobRecord::create(input, scheduled_at);
        self.store.save(&record).await?;
        self.metrics.record_enqueued();

        tracing::debug!(
            job_id = %record.id,
            job_type = %record.job_type,
            scheduled_at = ?record.scheduled_at,
            "Job persisted",
        );
        Ok(record.id)
    }

    // -----------------------------------------------------------------------
    // Worker side
    // -----------------------------------------------------------------------

    /// Execute a freshly claimed record and persist the outcome.
    ///
    /// A `Conflict` from any store transition means another worker already
    /// advanced this job (or the reclaimer took it back); the result is
    /// logged and swallowed so the caller simply continues polling.
    pub async fn execute(
        &self,
        record: JobRecord,
        cancellation: CancellationToken,
    ) -> Result<(), StoreError> {
        let ctx = JobContext {
            job_id: record.id,
            attempt: record.attempt,
            cancellation,
        };

        let outcome = self
            .registry
            .invoke(&record.job_type, ctx, record.payload.clone())
            .await;

        let result = match outcome {
            Ok(()) => self.finish_completed(&record).await,
            Err(err) => self.finish_failed(&record, err).await,
        };

        match result {
            Err(StoreError::Conflict(id)) => {
                tracing::debug!(job_id = %id, "Job already advanced by another worker");
                Ok(())
            }
            other => other,
        }
    }

    async fn finish_completed(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.store.mark_completed(record.id).await?;
        self.metrics.record_completed();
        tracing::info!(
            job_id = %record.id,
            job_type = %record.job_type,
            attempt = record.attempt + 1,
            "Job completed",
        );
        Ok(())
    }

    async fn finish_failed(
        &self,
        record: &JobRecord,
        err: ExecuteError,
    ) -> Result<(), StoreError> {
        let error_text = err.to_string();
        self.store.mark_failed(record.id, &error_text).await?;

        let attempt = record.attempt + 1;
        let exhausted = attempt >= record.max_attempts;

        if err.is_permanent() || exhausted {
            self.store.mark_dead(record.id, attempt).await?;
            self.metrics.record_dead();
            tracing::error!(
                job_id = %record.id,
                job_type = %record.job_type,
                attempt,
                permanent = err.is_permanent(),
                error = %error_text,
                "Job dead",
            );
            return Ok(());
        }

        // record.attempt counts completed attempts, so it doubles as the
        // backoff exponent for the attempt that just failed.
        let delay = backoff::retry_delay(record.attempt as u32, record.retry_hint());
        let next_attempt_at = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::hours(1));

        self.store
            .mark_retry(record.id, next_attempt_at, attempt)
            .await?;
        self.metrics.record_retried();
        tracing::warn!(
            job_id = %record.id,
            job_type = %record.job_type,
            attempt,
            next_attempt_at = %next_attempt_at,
            error = %error_text,
            "Job failed, retry scheduled",
        );
        Ok(())
    }
}
