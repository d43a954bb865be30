use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

pub const MIN_FULL_NAME_CHARS: usize = 2;
pub const MIN_FULL_NAME_TOKENS: usize = 2;
pub const MIN_PHONE_DIGITS: usize = 7;
pub const MAX_PHONE_DIGITS: usize = 15;
pub const DEFAULT_MIN_SUBJECT_CHARS: usize = 3;
pub const DEFAULT_MIN_MESSAGE_WORDS: usize = 10;
pub const DEFAULT_MAX_MESSAGE_WORDS: usize = 1_000;

/// User-correctable input problems, reported next to the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ValidationError {
    #[error("full name must contain at least first and last name")]
    NameInvalid,
    #[error("email address is not valid")]
    EmailInvalid,
    #[error("phone must be in international format (+ country code and number)")]
    PhoneInvalid,
    #[error("a contact reason is required")]
    ReasonRequired,
    #[error("subject is too short")]
    SubjectTooShort,
    #[error("message is too short")]
    MessageTooShort,
    #[error("message exceeds the maximum word count")]
    MessageTooLong,
}

impl ValidationError {
    /// Field the error belongs to, for inline display.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::NameInvalid => "name",
            Self::EmailInvalid => "email",
            Self::PhoneInvalid => "phone",
            Self::ReasonRequired => "reason",
            Self::SubjectTooShort => "subject",
            Self::MessageTooShort | Self::MessageTooLong => "message",
        }
    }

    #[must_use]
    pub fn message_key(self) -> &'static str {
        match self {
            Self::NameInvalid => "validation.name_invalid",
            Self::EmailInvalid => "validation.email_invalid",
            Self::PhoneInvalid => "validation.phone_invalid",
            Self::ReasonRequired => "validation.reason_required",
            Self::SubjectTooShort => "validation.subject_too_short",
            Self::MessageTooShort => "validation.message_too_short",
            Self::MessageTooLong => "validation.message_too_long",
        }
    }
}

/// Closed set of reasons a visitor can give for requesting contact details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactReason {
    Networking,
    JobOpportunity,
    Freelance,
    Collaboration,
    Other,
}

impl ContactReason {
    pub const ALL: [Self; 5] = [
        Self::Networking,
        Self::JobOpportunity,
        Self::Freelance,
        Self::Collaboration,
        Self::Other,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Networking => "networking",
            Self::JobOpportunity => "job_opportunity",
            Self::Freelance => "freelance",
            Self::Collaboration => "collaboration",
            Self::Other => "other",
        }
    }

    /// Accepts snake, kebab, camel and spaced spellings.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let collapsed = raw
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match collapsed.as_str() {
            "networking" => Some(Self::Networking),
            "jobopportunity" | "job" => Some(Self::JobOpportunity),
            "freelance" => Some(Self::Freelance),
            "collaboration" => Some(Self::Collaboration),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Limits applied to outbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimits {
    pub min_subject_chars: usize,
    pub min_message_words: usize,
    pub max_message_words: usize,
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            min_subject_chars: DEFAULT_MIN_SUBJECT_CHARS,
            min_message_words: DEFAULT_MIN_MESSAGE_WORDS,
            max_message_words: DEFAULT_MAX_MESSAGE_WORDS,
        }
    }
}

pub fn validate_full_name(raw: &str) -> Result<(), ValidationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_FULL_NAME_CHARS {
        return Err(ValidationError::NameInvalid);
    }
    if trimmed.split_whitespace().count() < MIN_FULL_NAME_TOKENS {
        return Err(ValidationError::NameInvalid);
    }
    Ok(())
}

/// Sender name on an outbound message; a single token is enough.
pub fn validate_sender_name(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().chars().count() < MIN_FULL_NAME_CHARS {
        return Err(ValidationError::NameInvalid);
    }
    Ok(())
}

/// RFC 5322-style address check that also requires a dotted domain.
pub fn validate_email(raw: &str) -> Result<(), ValidationError> {
    let trimmed = raw.trim();
    if !trimmed.validate_email() {
        return Err(ValidationError::EmailInvalid);
    }
    let dotted_domain = trimmed
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'));
    if !dotted_domain {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}

/// Returns the E.164 form of `raw` with separators removed.
pub fn normalize_phone(raw: &str) -> Result<String, ValidationError> {
    let compact = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '.' | '(' | ')'))
        .collect::<String>();
    let Some(digits) = compact.strip_prefix('+') else {
        return Err(ValidationError::PhoneInvalid);
    };
    if !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ValidationError::PhoneInvalid);
    }
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(ValidationError::PhoneInvalid);
    }
    if digits.starts_with('0') {
        return Err(ValidationError::PhoneInvalid);
    }
    Ok(compact)
}

pub fn validate_reason(raw: &str) -> Result<ContactReason, ValidationError> {
    ContactReason::parse(raw).ok_or(ValidationError::ReasonRequired)
}

pub fn validate_subject(raw: &str, limits: &MessageLimits) -> Result<(), ValidationError> {
    if raw.trim().chars().count() < limits.min_subject_chars {
        return Err(ValidationError::SubjectTooShort);
    }
    Ok(())
}

pub fn validate_message_body(raw: &str, limits: &MessageLimits) -> Result<(), ValidationError> {
    let words = word_count(raw);
    if words < limits.min_message_words {
        return Err(ValidationError::MessageTooShort);
    }
    if words > limits.max_message_words {
        return Err(ValidationError::MessageTooLong);
    }
    Ok(())
}

#[must_use]
pub fn word_count(raw: &str) -> usize {
    raw.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_requires_two_tokens() {
        assert_eq!(validate_full_name("John Doe"), Ok(()));
        assert_eq!(validate_full_name("  Maria  da Silva "), Ok(()));
        assert_eq!(validate_full_name("John"), Err(ValidationError::NameInvalid));
        assert_eq!(validate_full_name("   "), Err(ValidationError::NameInvalid));
    }

    #[test]
    fn email_accepts_common_shapes_and_rejects_broken_ones() {
        assert_eq!(validate_email("john@example.com"), Ok(()));
        assert_eq!(validate_email(" jo.hn+tag@mail.example.pt "), Ok(()));

        for broken in [
            "",
            "john",
            "john@",
            "@example.com",
            "john@example",
            "john@.com",
            "john@example.",
            "jo hn@example.com",
            "john@@example.com",
            "a@b@example.com",
            "john@example.com.",
            "john@-.com",
            "john@exa_mple.com",
            "jo\"hn@a.b",
            "john@a..com",
        ] {
            assert_eq!(
                validate_email(broken),
                Err(ValidationError::EmailInvalid),
                "{broken}"
            );
        }
    }

    #[test]
    fn phone_normalizes_separators() {
        assert_eq!(
            normalize_phone("+351 934-330-807"),
            Ok("+351934330807".to_string())
        );
        assert_eq!(normalize_phone("+1 (555) 010.9999"), Ok("+15550109999".to_string()));
    }

    #[test]
    fn phone_enforces_e164_bounds() {
        assert_eq!(normalize_phone("+1234567"), Ok("+1234567".to_string()));
        assert_eq!(normalize_phone("+123456"), Err(ValidationError::PhoneInvalid));
        assert_eq!(
            normalize_phone("+1234567890123456"),
            Err(ValidationError::PhoneInvalid)
        );
        assert_eq!(normalize_phone("+0351934330807"), Err(ValidationError::PhoneInvalid));
        assert_eq!(normalize_phone("351934330807"), Err(ValidationError::PhoneInvalid));
        assert_eq!(normalize_phone("+35193433080x"), Err(ValidationError::PhoneInvalid));
    }

    #[test]
    fn reason_parses_known_spellings_only() {
        assert_eq!(ContactReason::parse("networking"), Some(ContactReason::Networking));
        assert_eq!(
            ContactReason::parse("jobOpportunity"),
            Some(ContactReason::JobOpportunity)
        );
        assert_eq!(
            ContactReason::parse("job-opportunity"),
            Some(ContactReason::JobOpportunity)
        );
        assert_eq!(validate_reason(""), Err(ValidationError::ReasonRequired));
        assert_eq!(validate_reason("sales pitch"), Err(ValidationError::ReasonRequired));
        for reason in ContactReason::ALL {
            assert_eq!(ContactReason::parse(reason.as_str()), Some(reason));
        }
    }

    #[test]
    fn message_body_uses_word_bounds() {
        let limits = MessageLimits::default();
        let eleven = "one two three four five six seven eight nine ten eleven";
        let nine = "one two three four five six seven eight nine";
        assert_eq!(validate_message_body(eleven, &limits), Ok(()));
        assert_eq!(
            validate_message_body(nine, &limits),
            Err(ValidationError::MessageTooShort)
        );

        let long = "word ".repeat(limits.max_message_words + 1);
        assert_eq!(
            validate_message_body(&long, &limits),
            Err(ValidationError::MessageTooLong)
        );
    }

    #[test]
    fn subject_needs_three_characters() {
        let limits = MessageLimits::default();
        assert_eq!(validate_subject("Hi!", &limits), Ok(()));
        assert_eq!(
            validate_subject(" Hi ", &limits),
            Err(ValidationError::SubjectTooShort)
        );
    }
}
