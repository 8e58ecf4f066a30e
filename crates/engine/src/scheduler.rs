//! Producer-facing scheduler facade.
//!
//! A thin, cloneable pass-through over the dispatcher so producers depend on
//! a small surface (`enqueue`/`schedule`) rather than on the dispatcher's
//! construction and lifetime.

use std::sync::Arc;
use std::time::Duration;

use conveyor_core::types::JobId;
use conveyor_store::models::NewJob;

use crate::dispatcher::Dispatcher;
use crate::error::EnqueueError;

/// Public entry point for enqueueing work.
#[derive(Clone)]
pub struct JobScheduler {
    dispatcher: Arc<Dispatcher>,
}

impl JobScheduler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Persist a job that is due immediately.
    pub async fn enqueue(&self, input: NewJob) -> Result<JobId, EnqueueError> {
        self.dispatcher.enqueue(input).await
    }

    /// Persist a job that becomes due after `delay`.
    pub async fn schedule(&self, input: NewJob, delay: Duration) -> Result<JobId, EnqueueError> {
        self.dispatcher.schedule(input, delay).await
    }
}
