use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::{
    MessageLimits, ValidationError, normalize_phone, validate_email, validate_message_body,
    validate_sender_name, validate_subject,
};

/// Key casing expected by the receiving template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCase {
    #[default]
    Snake,
    Camel,
}

impl FieldCase {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "snake" | "snake_case" => Some(Self::Snake),
            "camel" | "camelcase" | "camel_case" => Some(Self::Camel),
            _ => None,
        }
    }

    fn key(self, snake: &'static str, camel: &'static str) -> &'static str {
        match self {
            Self::Snake => snake,
            Self::Camel => camel,
        }
    }
}

/// A message from the general contact form, built once per send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl OutboundMessage {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            subject: subject.into(),
            message: message.into(),
            phone: None,
            company_name: None,
            company_identifier: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn with_company(
        mut self,
        company_name: impl Into<String>,
        company_identifier: Option<String>,
    ) -> Self {
        self.company_name = Some(company_name.into());
        self.company_identifier = company_identifier;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Checks name, email, phone (when given), subject, then body.
    pub fn validate(&self, limits: &MessageLimits) -> Result<(), ValidationError> {
        validate_sender_name(&self.name)?;
        validate_email(&self.email)?;
        if let Some(phone) = non_empty(self.phone.as_deref()) {
            normalize_phone(phone)?;
        }
        validate_subject(&self.subject, limits)?;
        validate_message_body(&self.message, limits)
    }

    /// Sets the timestamp to `now` unless the caller already supplied one.
    pub fn fill_timestamp(&mut self, now: DateTime<Utc>) {
        if non_empty(self.timestamp.as_deref()).is_none() {
            self.timestamp = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
    }

    /// JSON body in the casing the receiving template expects.
    ///
    /// Optional fields are left out entirely when empty.
    #[must_use]
    pub fn to_payload(&self, case: FieldCase) -> Value {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::from(self.name.trim()));
        body.insert("email".to_string(), Value::from(self.email.trim()));
        body.insert("subject".to_string(), Value::from(self.subject.trim()));
        body.insert("message".to_string(), Value::from(self.message.trim()));

        let optional = [
            ("phone", self.phone.as_deref()),
            (
                case.key("company_name", "companyName"),
                self.company_name.as_deref(),
            ),
            (
                case.key("company_identifier", "companyIdentifier"),
                self.company_identifier.as_deref(),
            ),
            ("timestamp", self.timestamp.as_deref()),
        ];
        for (key, value) in optional {
            if let Some(value) = non_empty(value) {
                body.insert(key.to_string(), Value::from(value));
            }
        }
        Value::Object(body)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
