//! Contact privacy gate and form handling for the portfolio site.

pub mod form;
pub mod gate;
pub mod i18n;
pub mod message;
pub mod preferences;
pub mod storage;
pub mod validation;

pub use form::ContactFormInput;
pub use gate::{ContactDetails, ContactGate, GateState, UNLOCK_TTL_DAYS, UnlockRecord};
pub use i18n::{BuiltinCatalog, Language, MessageCatalog};
pub use message::{FieldCase, OutboundMessage};
pub use preferences::{ObservableStore, Preferences, SubscriptionId, Theme};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use validation::{ContactReason, MessageLimits, ValidationError};
