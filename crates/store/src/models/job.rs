//! Job record entity and create DTO.

use std::time::Duration;

use chrono::Utc;
use conveyor_core::types::{new_job_id, JobId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::{JobPriority, JobStatus, StatusId};

/// Default number of attempts when the producer does not specify one.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// A row from the `jobs` table: one unit of deferred work and its lifecycle
/// state.
///
/// Records are created by the dispatcher on enqueue/schedule and mutated only
/// through the store's claim/complete/retry/dead operations, never directly
/// by producers. They are never physically deleted by this subsystem.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobRecord {
    /// Immutable identifier, generated at creation.
    pub id: JobId,
    /// Registry key naming the handler that executes this job.
    pub job_type: String,
    /// Opaque payload, interpreted only by the resolved handler.
    pub payload: serde_json::Value,
    /// Claim priority; higher is claimed first.
    pub priority: StatusId,
    pub status_id: StatusId,
    /// When the job becomes due. `None` means due immediately.
    pub scheduled_at: Option<Timestamp>,
    /// Number of attempts completed so far. Never exceeds `max_attempts`.
    pub attempt: i32,
    pub max_attempts: i32,
    /// Error message from the most recent failed attempt.
    pub last_error: Option<String>,
    /// Optional per-job seed for the retry backoff schedule, in seconds.
    pub retry_delay_secs: Option<i64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRecord {
    /// Build a fresh Pending record from a create request.
    ///
    /// `scheduled_at = None` means due immediately; the dispatcher passes a
    /// future instant for delayed jobs.
    pub fn create(input: NewJob, scheduled_at: Option<Timestamp>) -> Self {
        let now = Utc::now();
        Self {
            id: new_job_id(),
            job_type: input.job_type,
            payload: input.payload,
            priority: input.priority.id(),
            status_id: JobStatus::Pending.id(),
            scheduled_at,
            attempt: 0,
            max_attempts: input.max_attempts,
            last_error: None,
            retry_delay_secs: input.retry_delay_secs,
            created_at: now,
            updated_at: now,
        }
    }

    /// A record is due when it is Pending and its scheduled time has passed
    /// (or was never set).
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.status_id == JobStatus::Pending.id()
            && self.scheduled_at.map_or(true, |at| at <= now)
    }

    /// The instant used to order records within a priority class: the
    /// scheduled time for delayed jobs, creation time for immediate ones.
    pub fn due_at(&self) -> Timestamp {
        self.scheduled_at.unwrap_or(self.created_at)
    }

    /// Backoff seed carried by the record, if any.
    pub fn retry_hint(&self) -> Option<Duration> {
        self.retry_delay_secs
            .filter(|s| *s > 0)
            .map(|s| Duration::from_secs(s as u64))
    }
}

// ---------------------------------------------------------------------------
// NewJob
// ---------------------------------------------------------------------------

/// Create request for a job, built by producers and turned into a
/// [`JobRecord`] by the dispatcher.
///
/// Constructed via [`NewJob::new`] and refined with the builder methods.
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Registry key of the handler to execute.
    pub job_type: String,
    /// Serialized payload for that handler.
    pub payload: serde_json::Value,
    /// Claim priority. Defaults to Normal.
    pub priority: JobPriority,
    /// Attempt budget. Must be at least 1. Defaults to 3.
    pub max_attempts: i32,
    /// Optional backoff seed in seconds.
    pub retry_delay_secs: Option<i64>,
}

impl NewJob {
    /// Create a request with the required fields and default policy.
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            job_type: job_type.into(),
            payload,
            priority: JobPriority::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: None,
        }
    }

    /// Set the claim priority.
    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the retry backoff seed.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_secs = Some(delay.as_secs() as i64);
        self
    }

    /// Validate the request.
    ///
    /// Rules:
    /// - `job_type` must not be empty.
    /// - `max_attempts` must be at least 1.
    /// - `retry_delay_secs`, when present, must not be negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.job_type.is_empty() {
            return Err("job_type must not be empty".to_string());
        }
        if self.max_attempts < 1 {
            return Err(format!(
                "max_attempts must be at least 1, got {}",
                self.max_attempts
            ));
        }
        if let Some(secs) = self.retry_delay_secs {
            if secs < 0 {
                return Err(format!("retry_delay_secs must not be negative, got {secs}"));
            }
        }
        Ok(())
    }
}
