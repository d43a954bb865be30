use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "pt")]
    Portuguese,
}

impl Language {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Portuguese => "pt",
        }
    }

    /// Accepts bare codes and regional tags such as `pt-BR` or `en_US`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let primary = normalized
            .split(['-', '_'])
            .next()
            .unwrap_or_default();
        match primary {
            "en" | "english" => Some(Self::English),
            "pt" | "portuguese" | "português" => Some(Self::Portuguese),
            _ => None,
        }
    }
}

/// Source of localized user-facing strings.
pub trait MessageCatalog {
    fn text(&self, key: &str, language: Language) -> Option<&str>;

    /// Falls back to English, then to the key itself.
    fn text_or_key<'a>(&'a self, key: &'a str, language: Language) -> &'a str {
        self.text(key, language)
            .or_else(|| self.text(key, Language::English))
            .unwrap_or(key)
    }
}

/// `(key, english, portuguese)`
const BUILTIN_ENTRIES: &[(&str, &str, &str)] = &[
    (
        "validation.name_invalid",
        "Please enter your first and last name.",
        "Por favor, indique o seu nome e apelido.",
    ),
    (
        "validation.email_invalid",
        "Please enter a valid email address.",
        "Por favor, indique um email válido.",
    ),
    (
        "validation.phone_invalid",
        "Please enter your phone in international format, e.g. +351912345678.",
        "Por favor, indique o telefone em formato internacional, ex. +351912345678.",
    ),
    (
        "validation.reason_required",
        "Please choose a reason for contact.",
        "Por favor, escolha o motivo do contacto.",
    ),
    (
        "validation.subject_too_short",
        "The subject must have at least 3 characters.",
        "O assunto deve ter pelo menos 3 caracteres.",
    ),
    (
        "validation.message_too_short",
        "The message must have at least 10 words.",
        "A mensagem deve ter pelo menos 10 palavras.",
    ),
    (
        "validation.message_too_long",
        "The message exceeds the maximum number of words.",
        "A mensagem excede o número máximo de palavras.",
    ),
    (
        "gate.locked",
        "Contact details are hidden. Fill in the short form to reveal them.",
        "Os dados de contacto estão ocultos. Preencha o formulário para os ver.",
    ),
    (
        "gate.unlocked",
        "Contact details unlocked for 30 days.",
        "Dados de contacto desbloqueados durante 30 dias.",
    ),
    (
        "gate.relocked",
        "Contact details hidden again. Your details are kept for a quick unlock.",
        "Dados de contacto ocultos novamente. Os seus dados ficam guardados para desbloquear rapidamente.",
    ),
    (
        "gate.deleted",
        "Your details were deleted from this device.",
        "Os seus dados foram apagados deste dispositivo.",
    ),
    (
        "submission.success",
        "Message sent. Thank you, I will get back to you soon.",
        "Mensagem enviada. Obrigado, responderei em breve.",
    ),
    (
        "submission.failed",
        "The message could not be delivered. Please try again later.",
        "Não foi possível enviar a mensagem. Tente novamente mais tarde.",
    ),
    (
        "submission.recipient_missing",
        "The email service has no recipient configured. Please reach out through LinkedIn instead.",
        "O serviço de email não tem destinatário configurado. Por favor, contacte-me pelo LinkedIn.",
    ),
    (
        "submission.network",
        "Could not reach the server. Check your connection and try again.",
        "Não foi possível contactar o servidor. Verifique a ligação e tente novamente.",
    ),
    (
        "submission.timeout",
        "The server took too long to answer. Check your connection and try again.",
        "O servidor demorou demasiado a responder. Verifique a ligação e tente novamente.",
    ),
    (
        "submission.rate_limited",
        "Please wait a moment before sending another message.",
        "Aguarde um momento antes de enviar outra mensagem.",
    ),
    (
        "submission.in_flight",
        "Your message is already being sent.",
        "A sua mensagem já está a ser enviada.",
    ),
    (
        "submission.misconfigured",
        "The contact form is not configured correctly.",
        "O formulário de contacto não está configurado corretamente.",
    ),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl MessageCatalog for BuiltinCatalog {
    fn text(&self, key: &str, language: Language) -> Option<&str> {
        BUILTIN_ENTRIES
            .iter()
            .find(|(entry_key, _, _)| *entry_key == key)
            .map(|(_, english, portuguese)| match language {
                Language::English => *english,
                Language::Portuguese => *portuguese,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn language_parses_regional_tags() {
        assert_eq!(Language::parse("pt-BR"), Some(Language::Portuguese));
        assert_eq!(Language::parse("EN_us"), Some(Language::English));
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn every_validation_error_has_both_translations() {
        let catalog = BuiltinCatalog;
        let errors = [
            ValidationError::NameInvalid,
            ValidationError::EmailInvalid,
            ValidationError::PhoneInvalid,
            ValidationError::ReasonRequired,
            ValidationError::SubjectTooShort,
            ValidationError::MessageTooShort,
            ValidationError::MessageTooLong,
        ];
        for error in errors {
            assert!(catalog.text(error.message_key(), Language::English).is_some());
            assert!(catalog.text(error.message_key(), Language::Portuguese).is_some());
        }
    }

    #[test]
    fn unknown_keys_fall_back_to_key() {
        let catalog = BuiltinCatalog;
        assert_eq!(
            catalog.text_or_key("missing.key", Language::Portuguese),
            "missing.key"
        );
        assert_eq!(
            catalog.text_or_key("gate.deleted", Language::Portuguese),
            "Os seus dados foram apagados deste dispositivo."
        );
    }
}
