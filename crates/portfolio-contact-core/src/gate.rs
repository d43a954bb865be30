//! Privacy gate in front of the site owner's contact details.
//!
//! The unlocked marker lives in three storage keys that are written and
//! cleared together. Expiry is applied lazily whenever the gate is read.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::form::ContactFormInput;
use crate::storage::{FORM_DATA_KEY, KeyValueStore, StorageError, UNLOCKED_AT_KEY, UNLOCKED_KEY};
use crate::validation::ValidationError;

pub const UNLOCK_TTL_DAYS: i64 = 30;

const UNLOCKED_FLAG: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Locked,
    Unlocking,
    Unlocked,
}

impl GateState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocking => "unlocking",
            Self::Unlocked => "unlocked",
        }
    }
}

/// Persisted proof that the visitor filled in the unlock form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockRecord {
    pub unlocked: bool,
    pub unlocked_at_epoch_ms: i64,
    pub submitted_form: ContactFormInput,
}

impl UnlockRecord {
    #[must_use]
    pub fn unlocked_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.unlocked_at_epoch_ms)
    }

    /// True while `now` lies within the TTL window around the unlock time.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.unlocked && within_ttl(self.unlocked_at_epoch_ms, now)
    }
}

fn within_ttl(unlocked_at_epoch_ms: i64, now: DateTime<Utc>) -> bool {
    DateTime::from_timestamp_millis(unlocked_at_epoch_ms).is_some_and(|unlocked_at| {
        now.signed_duration_since(unlocked_at).abs() <= Duration::days(UNLOCK_TTL_DAYS)
    })
}

/// Contact details shown on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: String,
    pub phone: String,
}

impl ContactDetails {
    #[must_use]
    pub fn new(email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Placeholder that keeps the shape but hides the content.
    #[must_use]
    pub fn masked(&self) -> Self {
        Self {
            email: mask_email(&self.email),
            phone: mask_phone(&self.phone),
        }
    }
}

fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return "*".repeat(email.chars().count().max(3));
    };
    let first = local.chars().next().map(String::from).unwrap_or_default();
    let tld = domain.rsplit_once('.').map(|(_, tld)| tld).unwrap_or_default();
    format!("{first}*****@*****.{tld}")
}

fn mask_phone(phone: &str) -> String {
    let chars = phone.chars().collect::<Vec<_>>();
    let keep_head = chars.len().min(4);
    let keep_tail = chars.len().saturating_sub(keep_head).min(2);
    chars
        .iter()
        .enumerate()
        .map(|(index, ch)| {
            if index < keep_head || index >= chars.len() - keep_tail || !ch.is_ascii_digit() {
                *ch
            } else {
                '*'
            }
        })
        .collect()
}

/// State machine deciding whether contact details are revealed.
pub struct ContactGate<S> {
    store: S,
    require_phone: bool,
    form_open: bool,
}

impl<S: KeyValueStore> ContactGate<S> {
    /// Gate for the dedicated unlock flow, which requires a phone number.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            require_phone: true,
            form_open: false,
        }
    }

    #[must_use]
    pub fn with_require_phone(mut self, require_phone: bool) -> Self {
        self.require_phone = require_phone;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state_at(Utc::now())
    }

    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> GateState {
        if self.form_open {
            return GateState::Unlocking;
        }
        if self.is_unlocked_at(now) {
            GateState::Unlocked
        } else {
            GateState::Locked
        }
    }

    /// Opens the unlock form. Has no effect while already unlocked.
    pub fn begin_unlock(&mut self) -> GateState {
        let now = Utc::now();
        if !self.is_unlocked_at(now) {
            self.form_open = true;
        }
        self.state_at(now)
    }

    pub fn cancel_unlock(&mut self) {
        self.form_open = false;
    }

    pub fn unlock(&mut self, form: ContactFormInput) -> Result<(), ValidationError> {
        self.unlock_at(form, Utc::now())
    }

    /// Validates `form` and, on success, persists the unlocked record.
    ///
    /// A failed write is logged and leaves the gate locked; the caller
    /// still gets `Ok` because the input itself was valid.
    pub fn unlock_at(
        &mut self,
        form: ContactFormInput,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let reason = form.validate(self.require_phone)?;
        self.form_open = false;

        let record = UnlockRecord {
            unlocked: true,
            unlocked_at_epoch_ms: now.timestamp_millis(),
            submitted_form: form,
        };
        match self.write_record(&record) {
            Ok(()) => tracing::info!(reason = reason.as_str(), "contact gate unlocked"),
            Err(error) => {
                tracing::warn!(error = %error, "failed to persist contact unlock; staying locked");
                self.clear_marker_quietly();
            }
        }
        Ok(())
    }

    /// Re-unlocks with the snapshot retained by a previous `lock`.
    ///
    /// Returns `Ok(false)` when no snapshot is stored.
    pub fn quick_unlock(&mut self) -> Result<bool, ValidationError> {
        let Some(form) = self.submitted_form() else {
            return Ok(false);
        };
        self.unlock(form)?;
        Ok(true)
    }

    /// Hides the details again but keeps the submitted form for a quick
    /// re-unlock.
    pub fn lock(&mut self) {
        self.form_open = false;
        if let Err(error) = self.clear_marker() {
            tracing::warn!(error = %error, "failed to clear contact unlock marker");
        }
        tracing::info!("contact gate locked");
    }

    /// Removes everything the gate stored, including the form snapshot.
    pub fn delete_data(&mut self) {
        self.form_open = false;
        if let Err(error) = self.clear_all() {
            tracing::warn!(error = %error, "failed to delete contact unlock data");
        }
        tracing::info!("contact gate data deleted");
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.is_unlocked_at(Utc::now())
    }

    /// Applies the TTL rule, clearing a stale or inconsistent record.
    #[must_use]
    pub fn is_unlocked_at(&self, now: DateTime<Utc>) -> bool {
        match self.read_marker() {
            Ok(Marker::Absent) => false,
            Ok(Marker::Present { unlocked_at_epoch_ms }) => {
                let live = within_ttl(unlocked_at_epoch_ms, now);
                if !live {
                    tracing::debug!("contact unlock expired; clearing record");
                    if let Err(error) = self.clear_all() {
                        tracing::warn!(error = %error, "failed to clear expired contact unlock");
                    }
                }
                live
            }
            Ok(Marker::Inconsistent) => {
                if let Err(error) = self.clear_all() {
                    tracing::warn!(error = %error, "failed to clear inconsistent contact unlock");
                }
                false
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to read contact unlock marker");
                false
            }
        }
    }

    /// The form captured at unlock time, if one is stored.
    #[must_use]
    pub fn submitted_form(&self) -> Option<ContactFormInput> {
        match self.store.get(FORM_DATA_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(form) => Some(form),
                Err(error) => {
                    tracing::warn!(error = %error, "stored contact form snapshot is corrupt");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(error = %error, "failed to read contact form snapshot");
                None
            }
        }
    }

    /// Full record when the gate is currently unlocked.
    #[must_use]
    pub fn record_at(&self, now: DateTime<Utc>) -> Option<UnlockRecord> {
        if !self.is_unlocked_at(now) {
            return None;
        }
        let unlocked_at_epoch_ms = match self.read_marker() {
            Ok(Marker::Present { unlocked_at_epoch_ms }) => unlocked_at_epoch_ms,
            _ => return None,
        };
        Some(UnlockRecord {
            unlocked: true,
            unlocked_at_epoch_ms,
            submitted_form: self.submitted_form()?,
        })
    }

    /// Real details when unlocked, otherwise the masked placeholder.
    #[must_use]
    pub fn contact_details(&self, details: &ContactDetails) -> ContactDetails {
        if self.is_unlocked() {
            details.clone()
        } else {
            details.masked()
        }
    }

    fn read_marker(&self) -> Result<Marker, StorageError> {
        let flag = self.store.get(UNLOCKED_KEY)?;
        let timestamp = self.store.get(UNLOCKED_AT_KEY)?;
        Ok(match (flag.as_deref(), timestamp) {
            (None, None) => Marker::Absent,
            (Some(UNLOCKED_FLAG), Some(raw)) => match raw.trim().parse::<i64>() {
                Ok(unlocked_at_epoch_ms) => Marker::Present {
                    unlocked_at_epoch_ms,
                },
                Err(_) => Marker::Inconsistent,
            },
            _ => Marker::Inconsistent,
        })
    }

    fn write_record(&self, record: &UnlockRecord) -> Result<(), StorageError> {
        let form_json = serde_json::to_string(&record.submitted_form)
            .map_err(|error| StorageError::Corrupt(error.to_string()))?;
        self.store.set(FORM_DATA_KEY, &form_json)?;
        self.store
            .set(UNLOCKED_AT_KEY, &record.unlocked_at_epoch_ms.to_string())?;
        self.store.set(UNLOCKED_KEY, UNLOCKED_FLAG)
    }

    fn clear_marker(&self) -> Result<(), StorageError> {
        self.store.remove(UNLOCKED_KEY)?;
        self.store.remove(UNLOCKED_AT_KEY)
    }

    fn clear_marker_quietly(&self) {
        if let Err(error) = self.clear_marker() {
            tracing::warn!(error = %error, "failed to roll back partial contact unlock");
        }
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        self.clear_marker()?;
        self.store.remove(FORM_DATA_KEY)
    }
}

enum Marker {
    Absent,
    Present { unlocked_at_epoch_ms: i64 },
    Inconsistent,
}
