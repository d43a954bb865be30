use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use portfolio_contact_core::{FieldCase, MessageLimits, OutboundMessage};
use reqwest::header::HeaderMap;

use crate::config::{SubmissionClientConfig, normalize_endpoint_url};
use crate::error::{ConfigError, SubmissionError};
use crate::http::{AttemptOutcome, SubmissionResponse, post_json_once};
use crate::retry::{Backoff, ExponentialBackoff, RetryPolicy};
use crate::transport::MessageTransport;

/// Posts contact messages to a workflow-automation webhook.
#[derive(Clone)]
pub struct WebhookClient {
    endpoint_url: String,
    timeout: Duration,
    headers: HeaderMap,
    retry: RetryPolicy,
    backoff: Arc<dyn Backoff>,
    field_case: FieldCase,
    message_limits: MessageLimits,
    http: reqwest::Client,
}

impl std::fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookClient")
            .field("endpoint_url", &self.endpoint_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("field_case", &self.field_case)
            .finish_non_exhaustive()
    }
}

impl WebhookClient {
    pub fn new(config: SubmissionClientConfig) -> Result<Self, ConfigError> {
        let endpoint_url = normalize_endpoint_url(&config.endpoint_url)?;
        let headers = config.auth.to_header_map()?;
        Ok(Self {
            endpoint_url,
            timeout: Duration::from_millis(config.timeout_ms.max(1)),
            headers,
            retry: config.retry,
            backoff: Arc::new(ExponentialBackoff::new(config.retry.base_delay_ms)),
            field_case: config.field_case,
            message_limits: config.message_limits,
            http: reqwest::Client::new(),
        })
    }

    /// Replaces the delay schedule between attempts.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// Validates and delivers `message`, retrying when the policy allows.
    ///
    /// Attempts run strictly one after another. Client errors (4xx) end
    /// the loop immediately; the last error is returned once the budget is
    /// spent.
    pub async fn send(
        &self,
        mut message: OutboundMessage,
    ) -> Result<SubmissionResponse, SubmissionError> {
        message.validate(&self.message_limits)?;
        message.fill_timestamp(Utc::now());
        let body = message.to_payload(self.field_case);
        let budget = self.retry.attempt_budget();

        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::debug!(attempt, budget, endpoint = %self.endpoint_url, "posting contact message");

            let error = match post_json_once(
                &self.http,
                &self.endpoint_url,
                &self.headers,
                &body,
                self.timeout,
            )
            .await
            {
                Ok(AttemptOutcome::Success { status, body }) => {
                    return Ok(SubmissionResponse {
                        status,
                        body,
                        attempts: attempt,
                    });
                }
                Ok(AttemptOutcome::Failure(failure)) => failure.into_error(),
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= budget {
                tracing::warn!(attempt, error = %error, "contact message delivery failed");
                return Err(error);
            }

            let delay = self.backoff.delay_after(attempt);
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "contact message delivery failed; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MessageTransport for WebhookClient {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(
        &self,
        message: OutboundMessage,
    ) -> Result<SubmissionResponse, SubmissionError> {
        self.send(message).await
    }
}
