//! Handler registry: maps job type names to executable handlers.
//!
//! Registration binds a name to a statically-typed handler once, at process
//! startup, by capturing the deserialize-then-invoke logic in a type-erased
//! closure. No runtime type inspection happens on the execution path, and
//! the registry is read-only once workers start (it is shared as
//! `Arc<HandlerRegistry>`).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use conveyor_core::types::JobId;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::ExecuteError;

// ---------------------------------------------------------------------------
// JobContext
// ---------------------------------------------------------------------------

/// Execution context handed to a handler alongside its payload.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Identifier of the record being executed.
    pub job_id: JobId,
    /// How many attempts have already failed (0 on the first run).
    pub attempt: i32,
    /// Cooperative shutdown signal. Handlers are expected to stop promptly
    /// when it fires; the engine never kills a handler.
    pub cancellation: CancellationToken,
}

impl JobContext {
    /// True once shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

// ---------------------------------------------------------------------------
// JobHandler
// ---------------------------------------------------------------------------

/// The logic executed for one job type.
///
/// `Payload` defines the concrete shape the stored JSON payload must
/// deserialize into; the registry performs that conversion before `run` is
/// called, so handlers only ever see typed data.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    type Payload: DeserializeOwned + Send;

    async fn run(&self, ctx: &JobContext, payload: Self::Payload) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

type InvokeFuture = Pin<Box<dyn Future<Output = Result<(), ExecuteError>> + Send>>;

/// Type-erased deserialize-then-invoke closure, built once at registration.
type Invoker = Arc<dyn Fn(JobContext, serde_json::Value) -> InvokeFuture + Send + Sync>;

/// Registry of job handlers, keyed by job type name.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Invoker>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `job_type` to `handler`. A second registration for the same name
    /// replaces the first (last one wins, as with route tables).
    pub fn register<H: JobHandler>(&mut self, job_type: impl Into<String>, handler: H) {
        let job_type = job_type.into();
        let handler = Arc::new(handler);
        let erased_type = job_type.clone();

        let invoker: Invoker = Arc::new(move |ctx, payload| {
            let handler = Arc::clone(&handler);
            let job_type = erased_type.clone();
            Box::pin(async move {
                let typed: H::Payload = serde_json::from_value(payload).map_err(|source| {
                    ExecuteError::PayloadDeserialization { job_type, source }
                })?;
                handler.run(&ctx, typed).await.map_err(ExecuteError::Handler)
            })
        });

        self.handlers.insert(job_type, invoker);
    }

    /// True when a handler is registered for `job_type`. Used by the
    /// dispatcher to fail enqueue requests fast.
    pub fn contains(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered job type names, for startup logging.
    pub fn job_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve and invoke the handler for `job_type`.
    pub async fn invoke(
        &self,
        job_type: &str,
        ctx: JobContext,
        payload: serde_json::Value,
    ) -> Result<(), ExecuteError> {
        let invoker = self
            .handlers
            .get(job_type)
            .ok_or_else(|| ExecuteError::UnknownHandler(job_type.to_string()))?;
        invoker(ctx, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct EchoPayload {
        message: String,
    }

    struct EchoHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobHandler for EchoHandler {
        type Payload = EchoPayload;

        async fn run(&self, _ctx: &JobContext, payload: Self::Payload) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::ensure!(!payload.message.is_empty(), "empty message");
            Ok(())
        }
    }

    fn ctx() -> JobContext {
        JobContext {
            job_id: conveyor_core::types::new_job_id(),
            attempt: 0,
            cancellation: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn registered_handler_receives_typed_payload() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register("echo", EchoHandler { calls: Arc::clone(&calls) });

        registry
            .invoke("echo", ctx(), serde_json::json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_job_type_is_reported() {
        let registry = HandlerRegistry::new();
        let result = registry.invoke("missing", ctx(), serde_json::Value::Null).await;
        assert_matches!(result, Err(ExecuteError::UnknownHandler(name)) if name == "missing");
    }

    #[tokio::test]
    async fn payload_shape_mismatch_is_reported() {
        let mut registry = HandlerRegistry::new();
        registry.register("echo", EchoHandler { calls: Arc::new(AtomicUsize::new(0)) });

        let result = registry
            .invoke("echo", ctx(), serde_json::json!({"wrong": 42}))
            .await;
        assert_matches!(result, Err(ExecuteError::PayloadDeserialization { job_type, .. }) if job_type == "echo");
    }

    #[tokio::test]
    async fn handler_error_is_wrapped() {
        let mut registry = HandlerRegistry::new();
        registry.register("echo", EchoHandler { calls: Arc::new(AtomicUsize::new(0)) });

        let result = registry
            .invoke("echo", ctx(), serde_json::json!({"message": ""}))
            .await;
        assert_matches!(result, Err(ExecuteError::Handler(_)));
    }

    #[test]
    fn contains_and_job_types_reflect_registrations() {
        let mut registry = HandlerRegistry::new();
        registry.register("b.second", EchoHandler { calls: Arc::new(AtomicUsize::new(0)) });
        registry.register("a.first", EchoHandler { calls: Arc::new(AtomicUsize::new(0)) });

        assert!(registry.contains("a.first"));
        assert!(!registry.contains("c.third"));
        assert_eq!(registry.job_types(), vec!["a.first", "b.second"]);
    }
}
