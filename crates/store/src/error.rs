//! Store error taxonomy.

use conveyor_core::types::JobId;

/// Errors surfaced by [`JobStore`](crate::store::JobStore) implementations.
///
/// `Conflict` and `Unavailable` are recoverable from a worker loop's point of
/// view: a conflict means another worker already advanced the job, an
/// unavailable backend is retried after the idle interval. `NotFound` is
/// surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Operation referenced an unknown job identifier.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// A conditional update lost a race; the record was already advanced by
    /// another worker. Treated as "continue polling", never fatal.
    #[error("Concurrent update conflict for job {0}")]
    Conflict(JobId),

    /// Create request failed validation before reaching the backend.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// The persistence backend is unreachable or failed internally.
    #[error("Job store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
