//! Job execution engine: handler registry, dispatcher, scheduler facade,
//! worker loop, and the visibility-timeout reclaimer.
//!
//! Bootstrap is two-phase: build the [`HandlerRegistry`] first (registration
//! is complete before anything polls), then construct the [`Dispatcher`] and
//! start [`Worker`] loops and the reclaimer, all sharing one cancellation
//! token.

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod reclaim;
pub mod registry;
pub mod scheduler;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use error::{EnqueueError, ExecuteError};
pub use metrics::{MetricsCounter, MetricsSnapshot};
pub use registry::{HandlerRegistry, JobContext, JobHandler};
pub use scheduler::JobScheduler;
pub use worker::Worker;
