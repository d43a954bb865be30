use portfolio_contact_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("submission endpoint url is missing")]
    EndpointMissing,
    #[error("submission endpoint url must use http:// or https:// and include a host: {0}")]
    EndpointInvalid(String),
    #[error("invalid {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("missing {0}")]
    MissingValue(String),
    #[error("invalid header {name}: {message}")]
    InvalidHeader { name: String, message: String },
    #[error("only one authentication scheme may be configured, found: {0}")]
    ConflictingAuth(String),
}

/// Everything that can go wrong between "submit" and a 2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationError),
    #[error("submission rejected ({status}): {message}")]
    Http { status: u16, message: String },
    /// The email provider has no destination address configured.
    #[error("recipient address missing ({status}): {message}")]
    RecipientMissing { status: u16, message: String },
    #[error("failed to encode request body: {message}")]
    Encoding { message: String },
    #[error("network error: {message}")]
    Network { message: String },
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("resubmission blocked for another {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("a submission is already in flight")]
    InFlight,
}

impl SubmissionError {
    /// Server errors and transport failures may succeed on a later attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500,
            Self::Network { .. } | Self::Timeout { .. } => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::RecipientMissing { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Catalog key for the banner shown to the visitor.
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Validation(error) => error.message_key(),
            Self::Http { .. } | Self::Encoding { .. } => "submission.failed",
            Self::RecipientMissing { .. } => "submission.recipient_missing",
            Self::Network { .. } => "submission.network",
            Self::Timeout { .. } => "submission.timeout",
            Self::RateLimited { .. } => "submission.rate_limited",
            Self::InFlight => "submission.in_flight",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_server_and_transport_failures_retry() {
        let server = SubmissionError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        let client = SubmissionError::Http {
            status: 400,
            message: "bad request".to_string(),
        };
        let recipient = SubmissionError::RecipientMissing {
            status: 422,
            message: "The recipients address is empty".to_string(),
        };

        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!recipient.is_retryable());
        assert!(SubmissionError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(
            SubmissionError::Network {
                message: "refused".to_string()
            }
            .is_retryable()
        );
        assert!(!SubmissionError::InFlight.is_retryable());
        assert!(
            !SubmissionError::Encoding {
                message: "key must be a string".to_string()
            }
            .is_retryable()
        );
        assert!(!SubmissionError::from(ValidationError::EmailInvalid).is_retryable());
    }

    #[test]
    fn recipient_missing_has_distinct_guidance() {
        let recipient = SubmissionError::RecipientMissing {
            status: 422,
            message: "empty".to_string(),
        };
        let generic = SubmissionError::Http {
            status: 422,
            message: "empty".to_string(),
        };
        assert_ne!(recipient.message_key(), generic.message_key());
        assert_eq!(recipient.status(), Some(422));
    }

    #[test]
    fn display_keeps_status_and_message() {
        let error = SubmissionError::Http {
            status: 502,
            message: "gateway failed".to_string(),
        };
        assert_eq!(error.to_string(), "submission rejected (502): gateway failed");
    }
}
