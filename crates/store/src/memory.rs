//! In-memory job store.
//!
//! Backs the test suites and single-process deployments that do not need
//! durability across restarts. A single mutex-guarded map provides the
//! atomic read-modify-write that the claim contract requires: the scan and
//! the transition to Processing happen under one lock acquisition.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use conveyor_core::types::{JobId, Timestamp};

use crate::error::StoreError;
use crate::models::{JobRecord, JobStatus};
use crate::store::JobStore;

/// Error recorded on records reset by the visibility-timeout sweep.
const RECLAIM_ERROR: &str = "claim expired: worker did not complete the job";

/// Mutex-guarded map of job records.
#[derive(Default)]
pub struct MemoryStore {
    jobs: Mutex<HashMap<JobId, JobRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `apply` on the record `id` only if it is currently Processing.
    ///
    /// Returns `NotFound` for unknown ids and `Conflict` when the record has
    /// already been advanced past Processing by another worker.
    fn update_processing<F>(&self, id: JobId, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.jobs.lock().expect("job map mutex poisoned");
        let record = jobs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if record.status_id != JobStatus::Processing.id() {
            return Err(StoreError::Conflict(id));
        }
        apply(record);
        record.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn save(&self, record: &JobRecord) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock().expect("job map mutex poisoned");
        jobs.insert(record.id, record.clone());
        Ok(())
    }

    async fn find(&self, id: JobId) -> Result<JobRecord, StoreError> {
        let jobs = self.jobs.lock().expect("job map mutex poisoned");
        jobs.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn claim_next(&self) -> Result<Option<JobRecord>, StoreError> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().expect("job map mutex poisoned");

        // Oldest highest-priority due record wins; the id tie-break keeps
        // selection deterministic for records created in the same instant.
        let next_id = jobs
            .values()
            .filter(|r| r.is_due(now))
            .min_by_key(|r| (Reverse(r.priority), r.due_at(), r.created_at, r.id))
            .map(|r| r.id);

        let Some(id) = next_id else {
            return Ok(None);
        };

        let record = jobs.get_mut(&id).expect("selected id exists under lock");
        record.status_id = JobStatus::Processing.id();
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn mark_failed(&self, id: JobId, error: &str) -> Result<(), StoreError> {
        self.update_processing(id, |record| {
            record.last_error = Some(error.to_string());
        })
    }

    async fn mark_completed(&self, id: JobId) -> Result<(), StoreError> {
        self.update_processing(id, |record| {
            record.status_id = JobStatus::Completed.id();
        })
    }

    async fn mark_retry(
        &self,
        id: JobId,
        next_attempt_at: Timestamp,
        attempt: i32,
    ) -> Result<(), StoreError> {
        self.update_processing(id, |record| {
            record.status_id = JobStatus::Pending.id();
            record.scheduled_at = Some(next_attempt_at);
            record.attempt = attempt;
        })
    }

    async fn mark_dead(&self, id: JobId, attempt: i32) -> Result<(), StoreError> {
        self.update_processing(id, |record| {
            record.status_id = JobStatus::Dead.id();
            record.attempt = attempt;
        })
    }

    async fn reclaim_stuck(&self, stuck_since: Timestamp) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().expect("job map mutex poisoned");
        let mut reclaimed = 0;

        for record in jobs.values_mut() {
            if record.status_id != JobStatus::Processing.id()
                || record.updated_at > stuck_since
            {
                continue;
            }
            record.attempt += 1;
            record.status_id = if record.attempt >= record.max_attempts {
                JobStatus::Dead.id()
            } else {
                JobStatus::Pending.id()
            };
            record.last_error = Some(RECLAIM_ERROR.to_string());
            record.updated_at = now;
            reclaimed += 1;
        }

        Ok(reclaimed)
    }
}
