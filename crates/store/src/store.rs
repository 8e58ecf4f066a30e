//! The pluggable job store contract.
//!
//! Any backend (in-memory map, relational table, document store) must satisfy
//! this contract. The crux is [`JobStore::claim_next`]: selection of a due
//! record and its transition to Processing MUST happen in a single atomic
//! read-modify-write, such as a lock-guarded scan or a `FOR UPDATE SKIP
//! LOCKED` row lock. A separate read followed by a separate write breaks the
//! guarantee and lets two workers execute the same job concurrently.

use async_trait::async_trait;
use conveyor_core::types::{JobId, Timestamp};

use crate::error::StoreError;
use crate::models::JobRecord;

/// Durable storage for [`JobRecord`]s.
///
/// All methods return [`StoreError::NotFound`] for unknown identifiers and
/// [`StoreError::Conflict`] when a conditional transition loses a race
/// (the record was no longer in the expected state).
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new or updated record. Idempotent on the identifier.
    async fn save(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Fetch a record by id.
    async fn find(&self, id: JobId) -> Result<JobRecord, StoreError>;

    /// Atomically claim the next due Pending record and transition it to
    /// Processing in the same step.
    ///
    /// Selection order: priority descending, then due time
    /// (`scheduled_at`, falling back to `created_at`) ascending, then
    /// `created_at` ascending. The oldest highest-priority job wins.
    /// Returns `None` without blocking when nothing is due. No two
    /// concurrent callers (whether tasks or separate processes) may receive
    /// the same record.
    async fn claim_next(&self) -> Result<Option<JobRecord>, StoreError>;

    /// Record the error of a failed attempt while the record is still
    /// Processing. Pre-step before the retry/dead decision.
    async fn mark_failed(&self, id: JobId, error: &str) -> Result<(), StoreError>;

    /// Transition Processing -> Completed. Rejects with `Conflict` when the
    /// record is not Processing (e.g. a second completion of the same id).
    async fn mark_completed(&self, id: JobId) -> Result<(), StoreError>;

    /// Transition Processing -> Pending with an incremented attempt count
    /// and a future `scheduled_at`.
    async fn mark_retry(
        &self,
        id: JobId,
        next_attempt_at: Timestamp,
        attempt: i32,
    ) -> Result<(), StoreError>;

    /// Transition Processing -> Dead (terminal) with the final attempt count.
    async fn mark_dead(&self, id: JobId, attempt: i32) -> Result<(), StoreError>;

    /// Visibility-timeout sweep: reset every record stuck in Processing since
    /// before `stuck_since` back to Pending with an incremented attempt
    /// count, or to Dead when the increment exhausts its attempt budget.
    /// Returns the number of records touched.
    ///
    /// Safety net for workers that crashed mid-execution; the base claim
    /// protocol assumes cooperative completion.
    async fn reclaim_stuck(&self, stuck_since: Timestamp) -> Result<u64, StoreError>;
}
