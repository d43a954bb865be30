//! Observable language and theme state owned by the application root.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::i18n::Language;
use crate::storage::{KeyValueStore, StorageError};

pub const LANGUAGE_KEY: &str = "portfolio.language";
pub const THEME_KEY: &str = "portfolio.theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct StoreInner<T> {
    value: T,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

/// Value cell with change notifications.
///
/// Listeners run after the internal lock is released, so a listener may
/// read or update the store it is subscribed to.
pub struct ObservableStore<T> {
    inner: Mutex<StoreInner<T>>,
}

impl<T: Clone + PartialEq> ObservableStore<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                value,
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Stores `value` and notifies listeners when it differs.
    ///
    /// Returns `true` when the value changed.
    pub fn set(&self, value: T) -> bool {
        let listeners = {
            let mut inner = self.lock();
            if inner.value == value {
                return false;
            }
            inner.value = value.clone();
            inner
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect::<Vec<_>>()
        };
        for listener in listeners {
            listener(&value);
        }
        true
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Site-wide preferences passed down from the application root.
pub struct Preferences {
    pub language: ObservableStore<Language>,
    pub theme: ObservableStore<Theme>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(Language::default(), Theme::default())
    }
}

impl Preferences {
    #[must_use]
    pub fn new(language: Language, theme: Theme) -> Self {
        Self {
            language: ObservableStore::new(language),
            theme: ObservableStore::new(theme),
        }
    }

    /// Restores saved preferences; unknown or unreadable values fall back
    /// to the defaults.
    #[must_use]
    pub fn load(store: &impl KeyValueStore) -> Self {
        let language = read_saved(store, LANGUAGE_KEY)
            .and_then(|raw| Language::parse(&raw))
            .unwrap_or_default();
        let theme = read_saved(store, THEME_KEY)
            .and_then(|raw| Theme::parse(&raw))
            .unwrap_or_default();
        Self::new(language, theme)
    }

    pub fn save(&self, store: &impl KeyValueStore) -> Result<(), StorageError> {
        store.set(LANGUAGE_KEY, self.language.get().as_str())?;
        store.set(THEME_KEY, self.theme.get().as_str())
    }
}

fn read_saved(store: &impl KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(key, error = %error, "failed to read saved preference");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn set_notifies_only_on_change() {
        let store = ObservableStore::new(Language::English);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let calls_clone = Arc::clone(&calls);
        let seen_clone = Arc::clone(&seen);
        store.subscribe(move |language: &Language| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut seen) = seen_clone.lock() {
                seen.push(*language);
            }
        });

        assert!(!store.set(Language::English));
        assert!(store.set(Language::Portuguese));
        assert_eq!(store.get(), Language::Portuguese);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            seen.lock().map(|seen| seen.clone()).unwrap_or_default(),
            vec![Language::Portuguese]
        );
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = ObservableStore::new(Theme::Light);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let id = store.subscribe(move |_: &Theme| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set(Theme::Dark);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn listener_may_read_store_during_notification() {
        let store = Arc::new(ObservableStore::new(Theme::Light));
        let observed = Arc::new(Mutex::new(None));

        let store_clone = Arc::clone(&store);
        let observed_clone = Arc::clone(&observed);
        store.subscribe(move |_: &Theme| {
            if let Ok(mut observed) = observed_clone.lock() {
                *observed = Some(store_clone.get());
            }
        });

        store.set(Theme::Light.toggled());
        assert_eq!(observed.lock().ok().and_then(|value| *value), Some(Theme::Dark));
    }

    #[test]
    fn preferences_round_trip_through_storage() -> Result<(), StorageError> {
        let storage = MemoryStore::new();
        assert_eq!(Preferences::load(&storage).language.get(), Language::English);

        let preferences = Preferences::default();
        preferences.language.set(Language::Portuguese);
        preferences.theme.set(Theme::Dark);
        preferences.save(&storage)?;

        let restored = Preferences::load(&storage);
        assert_eq!(restored.language.get(), Language::Portuguese);
        assert_eq!(restored.theme.get(), Theme::Dark);
        Ok(())
    }
}
