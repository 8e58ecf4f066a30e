//! Postgres-backed job store.
//!
//! Claiming uses `SELECT ... FOR UPDATE SKIP LOCKED` inside a single
//! `UPDATE`, so concurrent workers (including workers in other processes)
//! can never claim the same row. Conditional transitions carry the expected
//! status in the `WHERE` clause; a zero-row update is then resolved to
//! `NotFound` or `Conflict` with a follow-up existence check.

use async_trait::async_trait;
use conveyor_core::types::{JobId, Timestamp};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::{JobRecord, JobStatus};
use crate::store::JobStore;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, job_type, payload, priority, status_id, scheduled_at, \
    attempt, max_attempts, last_error, retry_delay_secs, \
    created_at, updated_at";

/// Error recorded on records reset by the visibility-timeout sweep.
const RECLAIM_ERROR: &str = "claim expired: worker did not complete the job";

/// Job store backed by a PostgreSQL `jobs` table.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled migrations (lookup tables, `jobs`, claim index).
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../db/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    /// Resolve a zero-row conditional update: the id is either unknown
    /// (`NotFound`) or the record was already advanced (`Conflict`).
    async fn resolve_zero_rows(&self, id: JobId) -> StoreError {
        let exists: Result<Option<i32>, sqlx::Error> =
            sqlx::query_scalar("SELECT 1 FROM jobs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await;
        match exists {
            Ok(Some(_)) => StoreError::Conflict(id),
            Ok(None) => StoreError::NotFound(id),
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl JobStore for PostgresStore {
    async fn save(&self, record: &JobRecord) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO jobs ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (id) DO UPDATE SET \
                 payload = EXCLUDED.payload, \
                 priority = EXCLUDED.priority, \
                 status_id = EXCLUDED.status_id, \
                 scheduled_at = EXCLUDED.scheduled_at, \
                 attempt = EXCLUDED.attempt, \
                 max_attempts = EXCLUDED.max_attempts, \
                 last_error = EXCLUDED.last_error, \
                 retry_delay_secs = EXCLUDED.retry_delay_secs, \
                 updated_at = EXCLUDED.updated_at"
        );
        sqlx::query(&query)
            .bind(record.id)
            .bind(&record.job_type)
            .bind(&record.payload)
            .bind(record.priority)
            .bind(record.status_id)
            .bind(record.scheduled_at)
            .bind(record.attempt)
            .bind(record.max_attempts)
            .bind(&record.last_error)
            .bind(record.retry_delay_secs)
            .bind(record.created_at)
            .bind(record.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, id: JobId) -> Result<JobRecord, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, JobRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn claim_next(&self) -> Result<Option<JobRecord>, StoreError> {
        let query = format!(
            "UPDATE jobs \
             SET status_id = $1, updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE status_id = $2 \
                   AND (scheduled_at IS NULL OR scheduled_at <= NOW()) \
                 ORDER BY priority DESC, \
                          COALESCE(scheduled_at, created_at) ASC, \
                          created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let claimed = sqlx::query_as::<_, JobRecord>(&query)
            .bind(JobStatus::Processing.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(&self.pool)
            .await?;
        Ok(claimed)
    }

    async fn mark_failed(&self, id: JobId, error: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE jobs SET last_error = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(error)
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.resolve_zero_rows(id).await);
        }
        Ok(())
    }

    async fn mark_completed(&self, id: JobId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE jobs SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(JobStatus::Completed.id())
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.resolve_zero_rows(id).await);
        }
        Ok(())
    }

    async fn mark_retry(
        &self,
        id: JobId,
        next_attempt_at: Timestamp,
        attempt: i32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, scheduled_at = $3, attempt = $4, updated_at = NOW() \
             WHERE id = $1 AND status_id = $5",
        )
        .bind(id)
        .bind(JobStatus::Pending.id())
        .bind(next_attempt_at)
        .bind(attempt)
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.resolve_zero_rows(id).await);
        }
        Ok(())
    }

    async fn mark_dead(&self, id: JobId, attempt: i32) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, attempt = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(id)
        .bind(JobStatus::Dead.id())
        .bind(attempt)
        .bind(JobStatus::Processing.id())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.resolve_zero_rows(id).await);
        }
        Ok(())
    }

    async fn reclaim_stuck(&self, stuck_since: Timestamp) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Records whose next attempt would exhaust the budget go straight
        // to Dead; the rest return to Pending for another claim.
        let dead = sqlx::query(
            "UPDATE jobs \
             SET status_id = $1, attempt = attempt + 1, last_error = $2, updated_at = NOW() \
             WHERE status_id = $3 AND updated_at <= $4 AND attempt + 1 >= max_attempts",
        )
        .bind(JobStatus::Dead.id())
        .bind(RECLAIM_ERROR)
        .bind(JobStatus::Processing.id())
        .bind(stuck_since)
        .execute(&mut *tx)
        .await?;

        let requeued = sqlx::query(
            "UPDATE jobs \
             SET status_id = $1, attempt = attempt + 1, last_error = $2, updated_at = NOW() \
             WHERE status_id = $3 AND updated_at <= $4",
        )
        .bind(JobStatus::Pending.id())
        .bind(RECLAIM_ERROR)
        .bind(JobStatus::Processing.id())
        .bind(stuck_since)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(dead.rows_affected() + requeued.rows_affected())
    }
}
