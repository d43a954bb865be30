//! Transactional email delivery through the EmailJS REST API.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use portfolio_contact_core::{MessageLimits, OutboundMessage};
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde_json::Value;

use crate::config::{EmailJsConfig, normalize_endpoint_url};
use crate::error::{ConfigError, SubmissionError};
use crate::http::{AttemptOutcome, HttpFailure, SubmissionResponse, post_json_once};
use crate::transport::MessageTransport;

const RECIPIENT_MISSING_STATUS: u16 = 422;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    from_name: &'a str,
    from_email: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<&'a str>,
}

/// Rejects a new send until the window after the last success has passed.
#[derive(Debug)]
pub struct Cooldown {
    window: Duration,
    last_success: Mutex<Option<Instant>>,
}

impl Cooldown {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_success: Mutex::new(None),
        }
    }

    /// Remaining wait at `now`, if any.
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        let last_success = self.last_success.lock().ok()?.as_ref().copied()?;
        let elapsed = now.saturating_duration_since(last_success);
        self.window
            .checked_sub(elapsed)
            .filter(|remaining| !remaining.is_zero())
    }

    pub fn record_success_at(&self, now: Instant) {
        if let Ok(mut last_success) = self.last_success.lock() {
            *last_success = Some(now);
        }
    }
}

/// Sends contact messages as templated emails.
#[derive(Debug)]
pub struct EmailJsTransport {
    endpoint_url: String,
    service_id: String,
    template_id: String,
    public_key: String,
    private_key: Option<String>,
    timeout: Duration,
    message_limits: MessageLimits,
    cooldown: Cooldown,
    http: reqwest::Client,
}

impl EmailJsTransport {
    pub fn new(config: EmailJsConfig) -> Result<Self, ConfigError> {
        let endpoint_url = normalize_endpoint_url(&config.endpoint_url)?;
        let service_id = required(config.service_id, "service_id")?;
        let template_id = required(config.template_id, "template_id")?;
        let public_key = required(config.public_key, "public_key")?;
        Ok(Self {
            endpoint_url,
            service_id,
            template_id,
            public_key,
            private_key: config
                .private_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            timeout: Duration::from_millis(config.timeout_ms.max(1)),
            message_limits: config.message_limits,
            cooldown: Cooldown::new(Duration::from_millis(config.cooldown_ms)),
            http: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    pub async fn send(
        &self,
        mut message: OutboundMessage,
    ) -> Result<SubmissionResponse, SubmissionError> {
        message.validate(&self.message_limits)?;
        if let Some(remaining) = self.cooldown.remaining_at(Instant::now()) {
            return Err(SubmissionError::RateLimited {
                retry_after_ms: remaining.as_millis() as u64,
            });
        }
        message.fill_timestamp(Utc::now());
        let body = self.request_body(&message)?;

        match post_json_once(
            &self.http,
            &self.endpoint_url,
            &HeaderMap::new(),
            &body,
            self.timeout,
        )
        .await?
        {
            AttemptOutcome::Success { status, body } => {
                self.cooldown.record_success_at(Instant::now());
                tracing::info!(status, "contact email sent");
                Ok(SubmissionResponse {
                    status,
                    body,
                    attempts: 1,
                })
            }
            AttemptOutcome::Failure(failure) => {
                let error = classify_failure(failure);
                tracing::warn!(error = %error, "contact email rejected");
                Err(error)
            }
        }
    }

    fn request_body(&self, message: &OutboundMessage) -> Result<Value, SubmissionError> {
        let request = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            access_token: self.private_key.as_deref(),
            template_params: TemplateParams {
                from_name: message.name.trim(),
                from_email: message.email.trim(),
                reply_to: message.email.trim(),
                subject: message.subject.trim(),
                message: message.message.trim(),
                phone: non_empty(message.phone.as_deref()),
                company_name: non_empty(message.company_name.as_deref()),
                company_identifier: non_empty(message.company_identifier.as_deref()),
                timestamp: non_empty(message.timestamp.as_deref()),
            },
        };
        serde_json::to_value(&request).map_err(|error| SubmissionError::Encoding {
            message: error.to_string(),
        })
    }
}

#[async_trait]
impl MessageTransport for EmailJsTransport {
    fn name(&self) -> &'static str {
        "emailjs"
    }

    async fn deliver(
        &self,
        message: OutboundMessage,
    ) -> Result<SubmissionResponse, SubmissionError> {
        self.send(message).await
    }
}

/// The provider answers 422 with a plain-text body when the template has
/// no destination address.
fn classify_failure(failure: HttpFailure) -> SubmissionError {
    if failure.status == RECIPIENT_MISSING_STATUS {
        let mentions_recipient = [failure.message.as_str(), failure.raw_body.as_str()]
            .iter()
            .any(|text| text.to_ascii_lowercase().contains("recipient"));
        if mentions_recipient {
            let message = if failure.raw_body.is_empty() {
                failure.message
            } else {
                failure.raw_body
            };
            return SubmissionError::RecipientMissing {
                status: failure.status,
                message,
            };
        }
    }
    failure.into_error()
}

fn required(value: String, field: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingValue(field.to_string()));
    }
    Ok(trimmed.to_string())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
