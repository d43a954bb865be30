use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::SubmissionError;

/// Payload of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ResponseBody {
    fn from_bytes(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResponse {
    pub status: u16,
    pub body: ResponseBody,
    /// Attempts spent, including the successful one.
    pub attempts: u32,
}

/// A non-2xx answer before it is mapped onto a transport's taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpFailure {
    pub status: u16,
    pub message: String,
    pub raw_body: String,
}

impl HttpFailure {
    pub(crate) fn from_response(status: StatusCode, bytes: &[u8]) -> Self {
        let raw_body = String::from_utf8_lossy(bytes).trim().to_string();
        let message = error_message_from_json(&raw_body)
            .or_else(|| status.canonical_reason().map(ToString::to_string))
            .or_else(|| non_empty(&raw_body))
            .unwrap_or_else(|| "<empty>".to_string());
        Self {
            status: status.as_u16(),
            message,
            raw_body,
        }
    }

    pub(crate) fn into_error(self) -> SubmissionError {
        SubmissionError::Http {
            status: self.status,
            message: self.message,
        }
    }
}

/// Picks `error` (string or `{message}`) or `message` out of a JSON body.
fn error_message_from_json(raw_body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(raw_body).ok()?;
    let from_error = match value.get("error") {
        Some(Value::String(message)) => non_empty(message),
        Some(Value::Object(error)) => error
            .get("message")
            .and_then(Value::as_str)
            .and_then(non_empty),
        _ => None,
    };
    from_error.or_else(|| value.get("message").and_then(Value::as_str).and_then(non_empty))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Outcome of a single POST, before retry decisions.
pub(crate) enum AttemptOutcome {
    Success { status: u16, body: ResponseBody },
    Failure(HttpFailure),
}

/// Sends one JSON POST with a hard deadline.
///
/// The deadline covers connect, send and reading the body; reqwest drops
/// the in-flight request when it fires.
pub(crate) async fn post_json_once(
    http: &reqwest::Client,
    url: &str,
    headers: &HeaderMap,
    body: &Value,
    timeout: Duration,
) -> Result<AttemptOutcome, SubmissionError> {
    let request_id = format!("req_{}", Uuid::new_v4().simple());
    let response = http
        .post(url)
        .headers(headers.clone())
        .header("x-request-id", request_id.as_str())
        .timeout(timeout)
        .json(body)
        .send()
        .await
        .map_err(|error| transport_error(&error, timeout))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|error| transport_error(&error, timeout))?;

    if status.is_success() {
        tracing::debug!(request_id = %request_id, status = status.as_u16(), "submission accepted");
        return Ok(AttemptOutcome::Success {
            status: status.as_u16(),
            body: ResponseBody::from_bytes(&bytes),
        });
    }
    tracing::debug!(request_id = %request_id, status = status.as_u16(), "submission rejected");
    Ok(AttemptOutcome::Failure(HttpFailure::from_response(
        status, &bytes,
    )))
}

fn transport_error(error: &reqwest::Error, timeout: Duration) -> SubmissionError {
    if error.is_timeout() {
        SubmissionError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        SubmissionError::Network {
            message: error_chain(error),
        }
    }
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_prefers_json_error_fields() {
        let nested = HttpFailure::from_response(
            StatusCode::BAD_REQUEST,
            br#"{"error":{"code":"invalid","message":"email rejected"}}"#,
        );
        assert_eq!(nested.message, "email rejected");

        let flat = HttpFailure::from_response(StatusCode::BAD_REQUEST, br#"{"error":"nope"}"#);
        assert_eq!(flat.message, "nope");

        let message = HttpFailure::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"message":"workflow crashed"}"#,
        );
        assert_eq!(message.message, "workflow crashed");
        assert_eq!(message.status, 500);
    }

    #[test]
    fn failure_message_falls_back_to_status_text_then_body() {
        let plain = HttpFailure::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            b"The recipients address is empty",
        );
        assert_eq!(plain.message, "Unprocessable Entity");
        assert_eq!(plain.raw_body, "The recipients address is empty");

        let unknown_status = StatusCode::from_u16(599).unwrap_or(StatusCode::IM_A_TEAPOT);
        let custom = HttpFailure::from_response(unknown_status, b" upstream exploded ");
        assert_eq!(custom.message, "upstream exploded");

        let empty = HttpFailure::from_response(unknown_status, b"");
        assert_eq!(empty.message, "<empty>");
    }

    #[test]
    fn success_body_is_json_text_or_empty() {
        assert_eq!(ResponseBody::from_bytes(b""), ResponseBody::Empty);
        assert_eq!(
            ResponseBody::from_bytes(b"OK"),
            ResponseBody::Text("OK".to_string())
        );
        assert_eq!(
            ResponseBody::from_bytes(br#"{"ok":true}"#),
            ResponseBody::Json(serde_json::json!({"ok": true}))
        );
    }
}
