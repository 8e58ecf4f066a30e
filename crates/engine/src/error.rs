//! Engine error taxonomy.

use conveyor_store::StoreError;

/// Errors produced while executing a claimed record.
///
/// `UnknownHandler` and `PayloadDeserialization` are permanent: retrying
/// cannot conjure a missing registration or change a stored payload, so the
/// dispatcher routes them straight to Dead.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The record names a handler with no registration.
    #[error("No handler registered for job type \"{0}\"")]
    UnknownHandler(String),

    /// The stored payload does not match the registered payload shape.
    #[error("Payload for job type \"{job_type}\" failed to deserialize: {source}")]
    PayloadDeserialization {
        job_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// The handler itself reported failure. Retried per the backoff policy.
    #[error("Handler failed: {0}")]
    Handler(anyhow::Error),
}

impl ExecuteError {
    /// Permanent failures skip the retry budget and go straight to Dead.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ExecuteError::UnknownHandler(_) | ExecuteError::PayloadDeserialization { .. }
        )
    }
}

/// Errors surfaced synchronously to producers on enqueue/schedule.
///
/// These are the only failures a producer ever sees; handler-execution
/// failures are asynchronous and observable only through the record's final
/// status and the metrics.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// Fail-fast contract violation: the job type has no registration.
    #[error("No handler registered for job type \"{0}\"")]
    UnknownHandler(String),

    /// The create request failed validation.
    #[error("Invalid job: {0}")]
    Invalid(String),

    /// The store rejected the save.
    #[error(transparent)]
    Store(#[from] StoreError),
}
