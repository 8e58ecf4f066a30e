//! Webhook delivery handler.
//!
//! Sends a JSON payload to an external URL via HTTP POST. One attempt per
//! job execution: failed deliveries are rescheduled by the queue's backoff
//! policy instead of a handler-local retry loop.

use std::time::Duration;

use async_trait::async_trait;
use conveyor_engine::{JobContext, JobHandler};
use serde::Deserialize;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Payload for `webhook.deliver` jobs.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Destination URL.
    pub url: String,
    /// JSON body POSTed to the destination.
    pub body: serde_json::Value,
}

/// Delivers job payloads to external webhook endpoints.
pub struct DeliverWebhookHandler {
    client: reqwest::Client,
}

impl DeliverWebhookHandler {
    /// Create a handler with a pre-configured HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client }
    }
}

impl Default for DeliverWebhookHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobHandler for DeliverWebhookHandler {
    type Payload = WebhookPayload;

    async fn run(&self, ctx: &JobContext, payload: Self::Payload) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&payload.url)
            .json(&payload.body)
            .send()
            .await?;

        let status = response.status();
        anyhow::ensure!(status.is_success(), "webhook returned HTTP {status}");

        tracing::info!(
            job_id = %ctx.job_id,
            url = %payload.url,
            status = status.as_u16(),
            "Webhook delivered",
        );
        Ok(())
    }
}
