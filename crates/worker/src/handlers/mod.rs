//! Built-in job handlers shipped with the worker host.
//!
//! Applications embedding the engine register their own handlers; the host
//! binary ships the two notification handlers every deployment has needed so
//! far. Registration happens once, before any worker loop starts.

pub mod email;
pub mod webhook;

use conveyor_engine::HandlerRegistry;

/// Job type executed by [`email::SendEmailHandler`].
pub const JOB_TYPE_SEND_EMAIL: &str = "email.send";

/// Job type executed by [`webhook::DeliverWebhookHandler`].
pub const JOB_TYPE_DELIVER_WEBHOOK: &str = "webhook.deliver";

/// Register every built-in handler that is configured in this environment.
///
/// The webhook handler is always available; the email handler is skipped
/// (with a log line) when SMTP is not configured, so jobs of that type would
/// fail fast at enqueue time instead of dying asynchronously.
pub fn register_all(registry: &mut HandlerRegistry) {
    registry.register(JOB_TYPE_DELIVER_WEBHOOK, webhook::DeliverWebhookHandler::new());

    match email::EmailConfig::from_env() {
        Some(config) => {
            registry.register(JOB_TYPE_SEND_EMAIL, email::SendEmailHandler::new(config));
        }
        None => {
            tracing::warn!(
                job_type = JOB_TYPE_SEND_EMAIL,
                "SMTP_HOST not set, email handler not registered",
            );
        }
    }
}
