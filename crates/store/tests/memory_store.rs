//! Contract tests for the in-memory store.
//!
//! These exercise the store guarantees every backend must satisfy: claim
//! exclusivity under concurrency, claim ordering, due-time correctness, and
//! conditional transition semantics.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use conveyor_store::models::{JobPriority, JobRecord, JobStatus, NewJob};
use conveyor_store::{JobStore, MemoryStore, StoreError};

fn new_job(job_type: &str) -> NewJob {
    NewJob::new(job_type, serde_json::json!({}))
}

async fn saved(store: &MemoryStore, input: NewJob, scheduled_at: Option<chrono::DateTime<chrono::Utc>>) -> JobRecord {
    let record = JobRecord::create(input, scheduled_at);
    store.save(&record).await.unwrap();
    record
}

// ---------------------------------------------------------------------------
// Claim exclusivity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_claims_never_return_the_same_record() {
    let store = Arc::new(MemoryStore::new());

    for i in 0..10 {
        saved(&store, new_job(&format!("job-{i}")), None).await;
    }

    // Twice as many claimers as records: each record must be claimed at
    // most once, and the surplus claimers must come back empty.
    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.claim_next().await.unwrap() }));
    }

    let mut claimed_ids = Vec::new();
    for handle in handles {
        if let Some(record) = handle.await.unwrap() {
            claimed_ids.push(record.id);
        }
    }

    claimed_ids.sort();
    let before_dedup = claimed_ids.len();
    claimed_ids.dedup();
    assert_eq!(claimed_ids.len(), before_dedup, "a record was claimed twice");
    assert_eq!(claimed_ids.len(), 10);
    assert!(store.claim_next().await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Claim ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn higher_priority_wins_over_older_low_priority() {
    let store = MemoryStore::new();
    let now = Utc::now();

    // The low-priority record is due a second earlier, but priority is the
    // primary sort key.
    let low = saved(
        &store,
        new_job("low").with_priority(JobPriority::Low),
        Some(now - Duration::seconds(2)),
    )
    .await;
    let high = saved(
        &store,
        new_job("high").with_priority(JobPriority::High),
        Some(now - Duration::seconds(1)),
    )
    .await;

    let first = store.claim_next().await.unwrap().unwrap();
    let second = store.claim_next().await.unwrap().unwrap();
    assert_eq!(first.id, high.id);
    assert_eq!(second.id, low.id);
}

#[tokio::test]
async fn equal_priority_is_fifo_by_due_time() {
    let store = MemoryStore::new();
    let now = Utc::now();

    let later = saved(&store, new_job("later"), Some(now - Duration::seconds(1))).await;
    let earlier = saved(&store, new_job("earlier"), Some(now - Duration::seconds(5))).await;

    let first = store.claim_next().await.unwrap().unwrap();
    let second = store.claim_next().await.unwrap().unwrap();
    assert_eq!(first.id, earlier.id);
    assert_eq!(second.id, later.id);
}

#[tokio::test]
async fn immediate_jobs_are_fifo_by_creation() {
    let store = MemoryStore::new();

    let first_in = saved(&store, new_job("first"), None).await;
    let second_in = saved(&store, new_job("second"), None).await;

    assert_eq!(store.claim_next().await.unwrap().unwrap().id, first_in.id);
    assert_eq!(store.claim_next().await.unwrap().unwrap().id, second_in.id);
}

// ---------------------------------------------------------------------------
// Due-time correctness
// ---------------------------------------------------------------------------

#[tokio::test]
async fn future_record_is_not_claimable_until_due() {
    let store = MemoryStore::new();
    let job = saved(&store, new_job("delayed"), Some(Utc::now() + Duration::seconds(5))).await;

    assert!(store.claim_next().await.unwrap().is_none());

    // Rewind the schedule instead of sleeping five seconds.
    let mut due = store.find(job.id).await.unwrap();
    due.scheduled_at = Some(Utc::now() - Duration::seconds(1));
    store.save(&due).await.unwrap();

    assert_eq!(store.claim_next().await.unwrap().unwrap().id, job.id);
}

#[tokio::test]
async fn claimed_record_is_processing() {
    let store = MemoryStore::new();
    let job = saved(&store, new_job("work"), None).await;

    store.claim_next().await.unwrap().unwrap();
    let found = store.find(job.id).await.unwrap();
    assert_eq!(found.status_id, JobStatus::Processing.id());
}

// ---------------------------------------------------------------------------
// Transition semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completing_twice_is_rejected_without_corrupting_state() {
    let store = MemoryStore::new();
    let job = saved(&store, new_job("once"), None).await;

    store.claim_next().await.unwrap().unwrap();
    store.mark_completed(job.id).await.unwrap();

    assert_matches!(
        store.mark_completed(job.id).await,
        Err(StoreError::Conflict(_))
    );
    let found = store.find(job.id).await.unwrap();
    assert_eq!(found.status_id, JobStatus::Completed.id());
}

#[tokio::test]
async fn retry_returns_record_to_pending_with_incremented_attempt() {
    let store = MemoryStore::new();
    let job = saved(&store, new_job("flaky"), None).await;

    store.claim_next().await.unwrap().unwrap();
    store.mark_failed(job.id, "boom").await.unwrap();
    let next_at = Utc::now() + Duration::seconds(30);
    store.mark_retry(job.id, next_at, 1).await.unwrap();

    let found = store.find(job.id).await.unwrap();
    assert_eq!(found.status_id, JobStatus::Pending.id());
    assert_eq!(found.attempt, 1);
    assert_eq!(found.scheduled_at, Some(next_at));
    assert_eq!(found.last_error.as_deref(), Some("boom"));

    // Not due yet, so it must not be claimable.
    assert!(store.claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn dead_is_terminal() {
    let store = MemoryStore::new();
    let job = saved(&store, new_job("doomed").with_max_attempts(1), None).await;

    store.claim_next().await.unwrap().unwrap();
    store.mark_failed(job.id, "fatal").await.unwrap();
    store.mark_dead(job.id, 1).await.unwrap();

    let found = store.find(job.id).await.unwrap();
    assert_eq!(found.status_id, JobStatus::Dead.id());
    assert_eq!(found.attempt, 1);
    assert!(store.claim_next().await.unwrap().is_none());
    assert_matches!(store.mark_retry(job.id, Utc::now(), 2).await, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn transitions_on_unknown_id_are_not_found() {
    let store = MemoryStore::new();
    let id = conveyor_core::types::new_job_id();

    assert_matches!(store.mark_completed(id).await, Err(StoreError::NotFound(_)));
    assert_matches!(store.mark_failed(id, "x").await, Err(StoreError::NotFound(_)));
    assert_matches!(store.mark_dead(id, 1).await, Err(StoreError::NotFound(_)));
}

// ---------------------------------------------------------------------------
// Visibility-timeout reclaim
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stuck_processing_record_returns_to_pending() {
    let store = MemoryStore::new();
    let job = saved(&store, new_job("orphaned"), None).await;
    store.claim_next().await.unwrap().unwrap();

    // Everything updated up to now counts as stuck.
    let reclaimed = store.reclaim_stuck(Utc::now()).await.unwrap();
    assert_eq!(reclaimed, 1);

    let found = store.find(job.id).await.unwrap();
    assert_eq!(found.status_id, JobStatus::Pending.id());
    assert_eq!(found.attempt, 1);
    assert!(found.last_error.is_some());
}

#[tokio::test]
async fn reclaim_at_attempt_ceiling_moves_record_to_dead() {
    let store = MemoryStore::new();
    let job = saved(&store, new_job("orphaned").with_max_attempts(1), None).await;
    store.claim_next().await.unwrap().unwrap();

    let reclaimed = store.reclaim_stuck(Utc::now()).await.unwrap();
    assert_eq!(reclaimed, 1);

    let found = store.find(job.id).await.unwrap();
    assert_eq!(found.status_id, JobStatus::Dead.id());
    assert_eq!(found.attempt, 1);
}

#[tokio::test]
async fn healthy_processing_record_is_left_alone() {
    let store = MemoryStore::new();
    saved(&store, new_job("active"), None).await;
    store.claim_next().await.unwrap().unwrap();

    // Cutoff in the past: the record was updated just now, so it is not stuck.
    let reclaimed = store
        .reclaim_stuck(Utc::now() - Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(reclaimed, 0);
}
