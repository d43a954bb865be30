//! `portfolio-contact`: drive the contact gate and send messages from a shell.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use portfolio_contact_core::{
    BuiltinCatalog, ContactDetails, ContactFormInput, ContactGate, FileStore, Language,
    MessageCatalog, OutboundMessage, Preferences, Theme, UNLOCK_TTL_DAYS, ValidationError,
};
use portfolio_submission_client::{
    EmailJsConfig, EmailJsTransport, MessageTransport, SubmissionClientConfig, SubmissionError,
    SubmissionGuard, SubmissionResponse, WebhookClient,
};

pub const ENV_STATE_DIR: &str = "PORTFOLIO_STATE_DIR";
pub const ENV_CONTACT_EMAIL: &str = "PORTFOLIO_CONTACT_EMAIL";
pub const ENV_CONTACT_PHONE: &str = "PORTFOLIO_CONTACT_PHONE";
pub const ENV_LANGUAGE: &str = "PORTFOLIO_LANGUAGE";

const DEFAULT_STATE_DIR: &str = ".portfolio-contact";
const STATE_FILE: &str = "state.json";

static CATALOG: BuiltinCatalog = BuiltinCatalog;

#[derive(Parser, Debug)]
#[command(name = "portfolio-contact")]
#[command(about = "Portfolio contact gate and message delivery")]
pub struct PortfolioCli {
    /// Directory holding the persisted gate state
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,
    /// Output language (en, pt); remembered for later runs
    #[arg(long, global = true, value_parser = parse_language)]
    pub language: Option<Language>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit the unlock form and reveal the contact details
    Unlock(UnlockArgs),
    /// Show whether the contact details are revealed
    Status,
    /// Hide the contact details again, keeping the form for a quick unlock
    Lock,
    /// Delete everything the gate stored
    Delete,
    /// Send a message through a delivery transport
    Send(SendArgs),
    /// Show or change the saved language and theme
    Preferences(PreferencesArgs),
}

#[derive(Args, Debug)]
pub struct PreferencesArgs {
    #[arg(long, value_parser = parse_theme, conflicts_with = "toggle_theme")]
    pub theme: Option<Theme>,
    #[arg(long)]
    pub toggle_theme: bool,
}

#[derive(Args, Debug)]
pub struct UnlockArgs {
    /// Reuse the form kept by a previous lock
    #[arg(long, conflicts_with_all = ["name", "email", "reason", "phone", "company", "form_json"])]
    pub quick: bool,
    /// Read the form from a JSON file exported by the site or an automation
    #[arg(long, value_name = "FILE", conflicts_with_all = ["name", "email", "reason", "phone", "company"])]
    pub form_json: Option<PathBuf>,
    #[arg(long, required_unless_present_any = ["quick", "form_json"])]
    pub name: Option<String>,
    #[arg(long, required_unless_present_any = ["quick", "form_json"])]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    /// networking, job_opportunity, freelance, collaboration or other
    #[arg(long, required_unless_present_any = ["quick", "form_json"])]
    pub reason: Option<String>,
    /// Accept the form without a phone number
    #[arg(long)]
    pub phone_optional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    Webhook,
    Emailjs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[arg(long, value_enum, default_value_t = TransportKind::Webhook)]
    pub transport: TransportKind,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub message: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    /// Company registration or tax number
    #[arg(long, requires = "company")]
    pub company_id: Option<String>,
}

impl SendArgs {
    fn to_message(&self) -> OutboundMessage {
        let mut message = OutboundMessage::new(
            self.name.clone(),
            self.email.clone(),
            self.subject.clone(),
            self.message.clone(),
        );
        if let Some(phone) = &self.phone {
            message = message.with_phone(phone.clone());
        }
        if let Some(company) = &self.company {
            message = message.with_company(company.clone(), self.company_id.clone());
        }
        message
    }
}

fn parse_language(raw: &str) -> Result<Language, String> {
    Language::parse(raw).ok_or_else(|| format!("unsupported language: {raw}"))
}

fn parse_theme(raw: &str) -> Result<Theme, String> {
    Theme::parse(raw).ok_or_else(|| format!("unsupported theme: {raw}"))
}

fn resolve_state_dir(cli: &PortfolioCli, lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    cli.state_dir
        .clone()
        .or_else(|| non_empty_lookup(lookup, ENV_STATE_DIR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

/// Flags merged over the environment and the saved preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    language: Language,
    contact: Option<ContactDetails>,
}

impl Settings {
    /// Language precedence: flag, then environment, then the saved choice.
    fn resolve(
        cli: &PortfolioCli,
        lookup: &impl Fn(&str) -> Option<String>,
        saved_language: Language,
    ) -> Result<Self> {
        let language = match (cli.language, non_empty_lookup(lookup, ENV_LANGUAGE)) {
            (Some(language), _) => language,
            (None, Some(raw)) => {
                Language::parse(&raw).ok_or_else(|| anyhow!("invalid {ENV_LANGUAGE}: {raw}"))?
            }
            (None, None) => saved_language,
        };

        let email = non_empty_lookup(lookup, ENV_CONTACT_EMAIL);
        let phone = non_empty_lookup(lookup, ENV_CONTACT_PHONE);
        let contact = (email.is_some() || phone.is_some()).then(|| {
            ContactDetails::new(email.unwrap_or_default(), phone.unwrap_or_default())
        });

        Ok(Self { language, contact })
    }

    fn text(&self, key: &'static str) -> &'static str {
        CATALOG.text_or_key(key, self.language)
    }
}

fn non_empty_lookup(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub async fn run(
    cli: PortfolioCli,
    lookup: &impl Fn(&str) -> Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    let store = FileStore::new(resolve_state_dir(&cli, lookup).join(STATE_FILE));
    tracing::debug!(path = %store.path().display(), "using contact gate state");

    let preferences = Preferences::load(&store);
    preferences.language.subscribe(|language| {
        tracing::info!(language = language.as_str(), "language preference changed");
    });
    preferences.theme.subscribe(|theme| {
        tracing::info!(theme = theme.as_str(), "theme preference changed");
    });
    if let Some(language) = cli.language {
        if preferences.language.set(language) {
            save_preferences(&preferences, &store);
        }
    }

    let settings = Settings::resolve(&cli, lookup, preferences.language.get())?;
    let mut gate = ContactGate::new(store);

    match cli.command {
        Commands::Unlock(args) => {
            let mut gate = gate.with_require_phone(!args.phone_optional);
            unlock(&mut gate, args, &settings)?;
            if !gate.is_unlocked() {
                return Err(anyhow!(
                    "contact unlock could not be saved to {}",
                    gate.store().path().display()
                ));
            }
            writeln!(out, "{}", settings.text("gate.unlocked"))?;
            write_details(out, &gate, &settings)
        }
        Commands::Status => status(out, &gate, &settings),
        Commands::Lock => {
            gate.lock();
            writeln!(out, "{}", settings.text("gate.relocked"))?;
            Ok(())
        }
        Commands::Delete => {
            gate.delete_data();
            writeln!(out, "{}", settings.text("gate.deleted"))?;
            Ok(())
        }
        Commands::Send(args) => send(out, args, lookup, &settings).await,
        Commands::Preferences(args) => {
            let next_theme = if args.toggle_theme {
                Some(preferences.theme.get().toggled())
            } else {
                args.theme
            };
            if let Some(theme) = next_theme {
                if preferences.theme.set(theme) {
                    save_preferences(&preferences, gate.store());
                }
            }
            writeln!(out, "language: {}", settings.language.as_str())?;
            writeln!(out, "theme: {}", preferences.theme.get().as_str())?;
            Ok(())
        }
    }
}

fn save_preferences(preferences: &Preferences, store: &FileStore) {
    if let Err(error) = preferences.save(store) {
        tracing::warn!(error = %error, "failed to save preferences");
    }
}

fn unlock(gate: &mut ContactGate<FileStore>, args: UnlockArgs, settings: &Settings) -> Result<()> {
    if args.quick {
        return match gate.quick_unlock() {
            Ok(true) => Ok(()),
            Ok(false) => Err(anyhow!(
                "no saved contact form; run unlock with --name, --email and --reason"
            )),
            Err(error) => Err(validation_failure(error, settings)),
        };
    }

    if let Some(path) = &args.form_json {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload = serde_json::from_str::<serde_json::Value>(&raw)
            .with_context(|| format!("{} is not valid JSON", path.display()))?;
        return gate
            .unlock(ContactFormInput::from_external(&payload))
            .map_err(|error| validation_failure(error, settings));
    }

    let mut form = ContactFormInput::new(
        args.name.unwrap_or_default(),
        args.email.unwrap_or_default(),
        args.reason.unwrap_or_default(),
    );
    if let Some(phone) = args.phone {
        form = form.with_phone(phone);
    }
    if let Some(company) = args.company {
        form = form.with_company(company);
    }
    gate.unlock(form)
        .map_err(|error| validation_failure(error, settings))
}

fn validation_failure(error: ValidationError, settings: &Settings) -> anyhow::Error {
    anyhow!("{} ({})", settings.text(error.message_key()), error.field())
}

fn status(out: &mut impl Write, gate: &ContactGate<FileStore>, settings: &Settings) -> Result<()> {
    let now = Utc::now();
    writeln!(out, "state: {}", gate.state_at(now).as_str())?;
    match gate.record_at(now) {
        Some(record) => {
            if let Some(unlocked_at) = record.unlocked_at() {
                let expires_at = unlocked_at + Duration::days(UNLOCK_TTL_DAYS);
                writeln!(
                    out,
                    "unlocked_at: {}",
                    unlocked_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                )?;
                writeln!(
                    out,
                    "expires_at: {}",
                    expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                )?;
            }
            writeln!(out, "name: {}", record.submitted_form.full_name)?;
        }
        None => writeln!(out, "{}", settings.text("gate.locked"))?,
    }
    write_details(out, gate, settings)
}

fn write_details(
    out: &mut impl Write,
    gate: &ContactGate<FileStore>,
    settings: &Settings,
) -> Result<()> {
    let Some(contact) = &settings.contact else {
        return Ok(());
    };
    let shown = gate.contact_details(contact);
    writeln!(out, "email: {}", shown.email)?;
    writeln!(out, "phone: {}", shown.phone)?;
    Ok(())
}

async fn send(
    out: &mut impl Write,
    args: SendArgs,
    lookup: &impl Fn(&str) -> Option<String>,
    settings: &Settings,
) -> Result<()> {
    let message = args.to_message();
    let misconfigured = |error: &dyn std::fmt::Display| {
        anyhow!("{} {error}", settings.text("submission.misconfigured"))
    };

    let result = match args.transport {
        TransportKind::Webhook => {
            let config =
                SubmissionClientConfig::from_lookup(lookup).map_err(|error| misconfigured(&error))?;
            let client = WebhookClient::new(config).map_err(|error| misconfigured(&error))?;
            deliver(client, message).await
        }
        TransportKind::Emailjs => {
            let config = EmailJsConfig::from_lookup(lookup).map_err(|error| misconfigured(&error))?;
            let transport =
                EmailJsTransport::new(config).map_err(|error| misconfigured(&error))?;
            deliver(transport, message).await
        }
    };

    match result {
        Ok(response) => {
            writeln!(out, "{}", settings.text("submission.success"))?;
            writeln!(
                out,
                "status: {} attempts: {}",
                response.status, response.attempts
            )?;
            Ok(())
        }
        Err(error) => Err(anyhow!("{} ({error})", settings.text(error.message_key()))),
    }
}

async fn deliver<T: MessageTransport>(
    transport: T,
    message: OutboundMessage,
) -> Result<SubmissionResponse, SubmissionError> {
    let guard = SubmissionGuard::new(transport);
    tracing::info!(transport = guard.transport().name(), "sending contact message");
    guard.submit(message).await
}
