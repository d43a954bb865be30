use std::collections::BTreeMap;

use portfolio_contact_core::{FieldCase, MessageLimits};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::ConfigError;
use crate::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, RetryPolicy};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_AUTH_HEADER: &str = "X-API-Key";
pub const DEFAULT_EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";
pub const DEFAULT_EMAILJS_COOLDOWN_MS: u64 = 60_000;

pub const ENV_WEBHOOK_URL: &str = "PORTFOLIO_WEBHOOK_URL";
pub const ENV_WEBHOOK_TIMEOUT_MS: &str = "PORTFOLIO_WEBHOOK_TIMEOUT_MS";
pub const ENV_WEBHOOK_BEARER_TOKEN: &str = "PORTFOLIO_WEBHOOK_BEARER_TOKEN";
pub const ENV_WEBHOOK_AUTH_HEADER: &str = "PORTFOLIO_WEBHOOK_AUTH_HEADER";
pub const ENV_WEBHOOK_AUTH_TOKEN: &str = "PORTFOLIO_WEBHOOK_AUTH_TOKEN";
pub const ENV_WEBHOOK_CUSTOM_HEADERS: &str = "PORTFOLIO_WEBHOOK_CUSTOM_HEADERS";
pub const ENV_WEBHOOK_FIELD_CASE: &str = "PORTFOLIO_WEBHOOK_FIELD_CASE";
pub const ENV_WEBHOOK_RETRY_ENABLED: &str = "PORTFOLIO_WEBHOOK_RETRY_ENABLED";
pub const ENV_WEBHOOK_RETRY_MAX_ATTEMPTS: &str = "PORTFOLIO_WEBHOOK_RETRY_MAX_ATTEMPTS";
pub const ENV_WEBHOOK_RETRY_BASE_DELAY_MS: &str = "PORTFOLIO_WEBHOOK_RETRY_BASE_DELAY_MS";

pub const ENV_EMAILJS_SERVICE_ID: &str = "PORTFOLIO_EMAILJS_SERVICE_ID";
pub const ENV_EMAILJS_TEMPLATE_ID: &str = "PORTFOLIO_EMAILJS_TEMPLATE_ID";
pub const ENV_EMAILJS_PUBLIC_KEY: &str = "PORTFOLIO_EMAILJS_PUBLIC_KEY";
pub const ENV_EMAILJS_PRIVATE_KEY: &str = "PORTFOLIO_EMAILJS_PRIVATE_KEY";
pub const ENV_EMAILJS_ENDPOINT: &str = "PORTFOLIO_EMAILJS_ENDPOINT";
pub const ENV_EMAILJS_TIMEOUT_MS: &str = "PORTFOLIO_EMAILJS_TIMEOUT_MS";
pub const ENV_EMAILJS_COOLDOWN_MS: &str = "PORTFOLIO_EMAILJS_COOLDOWN_MS";

/// How the client authenticates against the endpoint. One scheme per client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthScheme {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Header {
        name: String,
        token: String,
    },
    CustomHeaders(BTreeMap<String, String>),
}

impl AuthScheme {
    /// Header auth under the default header name.
    #[must_use]
    pub fn header(token: impl Into<String>) -> Self {
        Self::Header {
            name: DEFAULT_AUTH_HEADER.to_string(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    pub(crate) fn to_header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();
        match self {
            Self::None => {}
            Self::Bearer { token } => {
                insert_header(&mut headers, "authorization", &format!("Bearer {}", token.trim()))?;
            }
            Self::Header { name, token } => {
                insert_header(&mut headers, name, token.trim())?;
            }
            Self::CustomHeaders(custom) => {
                for (name, value) in custom {
                    insert_header(&mut headers, name, value)?;
                }
            }
        }
        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), ConfigError> {
    let header_name =
        HeaderName::from_bytes(name.trim().as_bytes()).map_err(|error| ConfigError::InvalidHeader {
            name: name.to_string(),
            message: error.to_string(),
        })?;
    let mut header_value = HeaderValue::from_str(value).map_err(|error| ConfigError::InvalidHeader {
        name: name.to_string(),
        message: error.to_string(),
    })?;
    header_value.set_sensitive(true);
    headers.insert(header_name, header_value);
    Ok(())
}

#[derive(Debug, Clone)]
pub struct SubmissionClientConfig {
    pub endpoint_url: String,
    pub timeout_ms: u64,
    pub auth: AuthScheme,
    pub retry: RetryPolicy,
    pub field_case: FieldCase,
    pub message_limits: MessageLimits,
}

impl SubmissionClientConfig {
    #[must_use]
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            auth: AuthScheme::None,
            retry: RetryPolicy::default(),
            field_case: FieldCase::default(),
            message_limits: MessageLimits::default(),
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthScheme) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn with_field_case(mut self, field_case: FieldCase) -> Self {
        self.field_case = field_case;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint_url = non_empty_lookup(lookup, ENV_WEBHOOK_URL)
            .ok_or(ConfigError::EndpointMissing)?;
        let timeout_ms = parse_u64_lookup(lookup, ENV_WEBHOOK_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)?;
        let field_case = match non_empty_lookup(lookup, ENV_WEBHOOK_FIELD_CASE) {
            Some(raw) => FieldCase::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: ENV_WEBHOOK_FIELD_CASE.to_string(),
                message: raw.clone(),
            })?,
            None => FieldCase::default(),
        };
        let retry = RetryPolicy {
            enabled: parse_bool_lookup(lookup, ENV_WEBHOOK_RETRY_ENABLED, false)?,
            max_attempts: parse_u64_lookup(
                lookup,
                ENV_WEBHOOK_RETRY_MAX_ATTEMPTS,
                u64::from(DEFAULT_MAX_ATTEMPTS),
            )?
            .clamp(1, 10) as u32,
            base_delay_ms: parse_u64_lookup(
                lookup,
                ENV_WEBHOOK_RETRY_BASE_DELAY_MS,
                DEFAULT_BASE_DELAY_MS,
            )?,
        };

        Ok(Self {
            endpoint_url,
            timeout_ms,
            auth: auth_from_lookup(lookup)?,
            retry,
            field_case,
            message_limits: MessageLimits::default(),
        })
    }
}

fn auth_from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<AuthScheme, ConfigError> {
    let bearer = non_empty_lookup(lookup, ENV_WEBHOOK_BEARER_TOKEN);
    let header_token = non_empty_lookup(lookup, ENV_WEBHOOK_AUTH_TOKEN);
    let custom = non_empty_lookup(lookup, ENV_WEBHOOK_CUSTOM_HEADERS);

    let configured = [
        (ENV_WEBHOOK_BEARER_TOKEN, bearer.is_some()),
        (ENV_WEBHOOK_AUTH_TOKEN, header_token.is_some()),
        (ENV_WEBHOOK_CUSTOM_HEADERS, custom.is_some()),
    ]
    .into_iter()
    .filter_map(|(key, present)| present.then_some(key))
    .collect::<Vec<_>>();
    if configured.len() > 1 {
        return Err(ConfigError::ConflictingAuth(configured.join(",")));
    }

    if let Some(token) = bearer {
        return Ok(AuthScheme::Bearer { token });
    }
    if let Some(token) = header_token {
        let name = non_empty_lookup(lookup, ENV_WEBHOOK_AUTH_HEADER)
            .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string());
        return Ok(AuthScheme::Header { name, token });
    }
    if let Some(raw) = custom {
        return parse_custom_headers(&raw).map(AuthScheme::CustomHeaders);
    }
    Ok(AuthScheme::None)
}

/// `Name: value; Other-Name: value`
fn parse_custom_headers(raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut headers = BTreeMap::new();
    for entry in raw.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((name, value)) = entry.split_once(':') else {
            return Err(ConfigError::InvalidValue {
                key: ENV_WEBHOOK_CUSTOM_HEADERS.to_string(),
                message: format!("expected name:value, got {entry}"),
            });
        };
        headers.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// Settings for the transactional email provider transport.
#[derive(Debug, Clone)]
pub struct EmailJsConfig {
    pub endpoint_url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub private_key: Option<String>,
    pub timeout_ms: u64,
    pub cooldown_ms: u64,
    pub message_limits: MessageLimits,
}

impl EmailJsConfig {
    #[must_use]
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_url: DEFAULT_EMAILJS_ENDPOINT.to_string(),
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            private_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cooldown_ms: DEFAULT_EMAILJS_COOLDOWN_MS,
            message_limits: MessageLimits::default(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = endpoint_url.into();
        self
    }

    #[must_use]
    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            non_empty_lookup(lookup, key).ok_or_else(|| ConfigError::MissingValue(key.to_string()))
        };
        let mut config = Self::new(
            required(ENV_EMAILJS_SERVICE_ID)?,
            required(ENV_EMAILJS_TEMPLATE_ID)?,
            required(ENV_EMAILJS_PUBLIC_KEY)?,
        );
        config.private_key = non_empty_lookup(lookup, ENV_EMAILJS_PRIVATE_KEY);
        if let Some(endpoint_url) = non_empty_lookup(lookup, ENV_EMAILJS_ENDPOINT) {
            config.endpoint_url = endpoint_url;
        }
        config.timeout_ms = parse_u64_lookup(lookup, ENV_EMAILJS_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)?;
        config.cooldown_ms =
            parse_u64_lookup(lookup, ENV_EMAILJS_COOLDOWN_MS, DEFAULT_EMAILJS_COOLDOWN_MS)?;
        Ok(config)
    }
}

pub(crate) fn normalize_endpoint_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EndpointMissing);
    }
    let invalid = || ConfigError::EndpointInvalid(trimmed.to_string());
    let parsed = reqwest::Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid());
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

fn non_empty_lookup(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_u64_lookup(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    match non_empty_lookup(lookup, key) {
        Some(raw) => raw.parse::<u64>().map_err(|error| ConfigError::InvalidValue {
            key: key.to_string(),
            message: error.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_bool_lookup(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = non_empty_lookup(lookup, key) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: other.to_string(),
        }),
    }
}
