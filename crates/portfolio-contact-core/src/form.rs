use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::{
    ContactReason, ValidationError, normalize_phone, validate_email, validate_full_name,
    validate_reason,
};

/// Input captured by the contact-unlock form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormInput {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub reason: String,
}

const FULL_NAME_KEYS: [&str; 5] = ["fullName", "FullName", "full_name", "name", "Name"];
const EMAIL_KEYS: [&str; 3] = ["email", "Email", "emailAddress"];
const PHONE_KEYS: [&str; 4] = ["phone", "Phone", "phoneNumber", "phone_number"];
const COMPANY_KEYS: [&str; 5] = ["company", "Company", "companyName", "CompanyName", "company_name"];
const REASON_KEYS: [&str; 3] = ["reason", "Reason", "contactReason"];

impl ContactFormInput {
    #[must_use]
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            phone: None,
            company: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Maps any known external payload shape onto the canonical record.
    ///
    /// Form widgets, stored snapshots and automation payloads disagree on
    /// field casing; this is the only place those aliases are resolved.
    #[must_use]
    pub fn from_external(payload: &Value) -> Self {
        Self {
            full_name: first_string(payload, &FULL_NAME_KEYS).unwrap_or_default(),
            email: first_string(payload, &EMAIL_KEYS).unwrap_or_default(),
            phone: first_string(payload, &PHONE_KEYS),
            company: first_string(payload, &COMPANY_KEYS),
            reason: first_string(payload, &REASON_KEYS).unwrap_or_default(),
        }
    }

    /// Validates in display order: name, email, phone, reason.
    ///
    /// `require_phone` is set by the dedicated unlock flow; otherwise the
    /// phone is only checked when present.
    pub fn validate(&self, require_phone: bool) -> Result<ContactReason, ValidationError> {
        validate_full_name(&self.full_name)?;
        validate_email(&self.email)?;
        match self.phone.as_deref().map(str::trim).filter(|phone| !phone.is_empty()) {
            Some(phone) => {
                normalize_phone(phone)?;
            }
            None if require_phone => return Err(ValidationError::PhoneInvalid),
            None => {}
        }
        validate_reason(&self.reason)
    }
}

fn first_string(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_form() -> ContactFormInput {
        ContactFormInput::new("John Doe", "john@example.com", "networking")
            .with_phone("+351934330807")
    }

    #[test]
    fn valid_form_passes_with_required_phone() {
        assert_eq!(valid_form().validate(true), Ok(ContactReason::Networking));
    }

    #[test]
    fn validation_reports_first_failing_rule() {
        let mut form = valid_form();
        form.full_name = "John".to_string();
        form.email = "not-an-email".to_string();
        assert_eq!(form.validate(true), Err(ValidationError::NameInvalid));

        form.full_name = "John Doe".to_string();
        assert_eq!(form.validate(true), Err(ValidationError::EmailInvalid));

        form.email = "john@example.com".to_string();
        form.phone = Some("12345".to_string());
        assert_eq!(form.validate(true), Err(ValidationError::PhoneInvalid));

        form.phone = Some("+351934330807".to_string());
        form.reason = String::new();
        assert_eq!(form.validate(true), Err(ValidationError::ReasonRequired));
    }

    #[test]
    fn phone_is_optional_outside_unlock_flow() {
        let form = ContactFormInput::new("Ana Costa", "ana@example.pt", "freelance");
        assert_eq!(form.validate(false), Ok(ContactReason::Freelance));
        assert_eq!(form.validate(true), Err(ValidationError::PhoneInvalid));

        let blank_phone = form.with_phone("   ");
        assert_eq!(blank_phone.validate(false), Ok(ContactReason::Freelance));
    }

    #[test]
    fn from_external_resolves_pascal_and_camel_aliases() {
        let pascal = json!({
            "FullName": "John Doe",
            "Email": "john@example.com",
            "Phone": "+351934330807",
            "CompanyName": "Acme",
            "Reason": "networking"
        });
        let camel = json!({
            "fullName": " John Doe ",
            "email": "john@example.com",
            "phoneNumber": "+351934330807",
            "company": "Acme",
            "reason": "networking",
            "unknown": 42
        });

        let expected = valid_form().with_company("Acme");
        assert_eq!(ContactFormInput::from_external(&pascal), expected);
        assert_eq!(ContactFormInput::from_external(&camel), expected);
    }

    #[test]
    fn from_external_treats_non_strings_as_absent() {
        let payload = json!({ "fullName": 7, "email": null, "phone": "" });
        let form = ContactFormInput::from_external(&payload);
        assert_eq!(form.full_name, "");
        assert_eq!(form.email, "");
        assert_eq!(form.phone, None);
        assert_eq!(form.validate(false), Err(ValidationError::NameInvalid));
    }

    #[test]
    fn snapshot_serializes_in_camel_case() {
        let encoded = serde_json::to_value(valid_form()).unwrap_or(Value::Null);
        assert_eq!(encoded["fullName"], "John Doe");
        assert!(encoded.get("company").is_none());
    }
}
