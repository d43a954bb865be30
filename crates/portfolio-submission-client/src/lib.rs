//! Outbound delivery of contact messages.
//!
//! Two transports are provided: [`WebhookClient`] posts JSON to a
//! workflow-automation webhook with optional bounded retries, and
//! [`EmailJsTransport`] sends a templated email with a resubmission
//! cooldown. Both validate the message before any network traffic and
//! report failures through [`SubmissionError`].

mod config;
mod emailjs;
mod error;
mod http;
mod retry;
mod transport;
mod webhook;

pub use config::{
    AuthScheme, DEFAULT_AUTH_HEADER, DEFAULT_EMAILJS_COOLDOWN_MS, DEFAULT_EMAILJS_ENDPOINT,
    DEFAULT_TIMEOUT_MS, ENV_EMAILJS_COOLDOWN_MS, ENV_EMAILJS_ENDPOINT, ENV_EMAILJS_PRIVATE_KEY,
    ENV_EMAILJS_PUBLIC_KEY, ENV_EMAILJS_SERVICE_ID, ENV_EMAILJS_TEMPLATE_ID,
    ENV_EMAILJS_TIMEOUT_MS, ENV_WEBHOOK_AUTH_HEADER, ENV_WEBHOOK_AUTH_TOKEN,
    ENV_WEBHOOK_BEARER_TOKEN, ENV_WEBHOOK_CUSTOM_HEADERS, ENV_WEBHOOK_FIELD_CASE,
    ENV_WEBHOOK_RETRY_BASE_DELAY_MS, ENV_WEBHOOK_RETRY_ENABLED, ENV_WEBHOOK_RETRY_MAX_ATTEMPTS,
    ENV_WEBHOOK_TIMEOUT_MS, ENV_WEBHOOK_URL, EmailJsConfig, SubmissionClientConfig,
};
pub use emailjs::{Cooldown, EmailJsTransport};
pub use error::{ConfigError, SubmissionError};
pub use http::{ResponseBody, SubmissionResponse};
pub use retry::{
    Backoff, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, ExponentialBackoff, NoBackoff,
    RetryPolicy,
};
pub use transport::{MessageTransport, SubmissionGuard};
pub use webhook::WebhookClient;
