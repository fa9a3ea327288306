//! Persisted display preferences.
//!
//! Values are stored as small JSON documents under fixed keys. Missing or
//! unreadable data never fails a load; the affected preference falls back to
//! its default and the problem is logged.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::lock;
use crate::domain::preferences::{
    Preferences, SortOrder, THEME_MODE_KEY, ThemeMode, ThemeRecord, USER_PREFERENCES_KEY,
    ViewMode, ViewRecord,
};
use crate::infra::error::InfraError;

/// Key/value persistence for preference documents.
pub trait PreferenceStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, InfraError>;

    fn save(&self, key: &str, value: &str) -> Result<(), InfraError>;
}

/// Process-local store; contents vanish on exit.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Result<Option<String>, InfraError> {
        Ok(lock::lock(&self.values, "prefs.load").get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), InfraError> {
        lock::lock(&self.values, "prefs.save").insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct PreferencesController {
    store: Arc<dyn PreferenceStore>,
    current: Preferences,
}

impl fmt::Debug for PreferencesController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferencesController")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl PreferencesController {
    /// Read both preference documents, defaulting anything absent or corrupt.
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let theme: ThemeRecord = read_record(store.as_ref(), THEME_MODE_KEY);
        let view: ViewRecord = read_record(store.as_ref(), USER_PREFERENCES_KEY);
        let current = Preferences {
            theme: theme.mode,
            view_mode: view.view_mode,
            sort_order: view.sort_order,
        };
        debug!(
            theme = %current.theme,
            view_mode = %current.view_mode,
            sort_order = %current.sort_order,
            "Loaded preferences"
        );
        Self { store, current }
    }

    pub fn current(&self) -> Preferences {
        self.current
    }

    pub fn theme(&self) -> ThemeMode {
        self.current.theme
    }

    pub fn toggle_theme(&mut self) -> Result<ThemeMode, InfraError> {
        let next = self.current.theme.toggled();
        self.set_theme(next)?;
        Ok(next)
    }

    /// Setters persist before updating memory; a failed save changes nothing.
    pub fn set_theme(&mut self, theme: ThemeMode) -> Result<(), InfraError> {
        write_record(
            self.store.as_ref(),
            THEME_MODE_KEY,
            &ThemeRecord { mode: theme },
        )?;
        self.current.theme = theme;
        Ok(())
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> Result<(), InfraError> {
        self.save_view_record(ViewRecord {
            view_mode,
            sort_order: self.current.sort_order,
        })?;
        self.current.view_mode = view_mode;
        Ok(())
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) -> Result<(), InfraError> {
        self.save_view_record(ViewRecord {
            view_mode: self.current.view_mode,
            sort_order,
        })?;
        self.current.sort_order = sort_order;
        Ok(())
    }

    fn save_view_record(&self, record: ViewRecord) -> Result<(), InfraError> {
        write_record(self.store.as_ref(), USER_PREFERENCES_KEY, &record)
    }
}

fn read_record<T: DeserializeOwned + Default>(store: &dyn PreferenceStore, key: &str) -> T {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            warn!(key, error = %err, "Failed to read preferences; using defaults");
            return T::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        warn!(key, error = %err, "Discarding corrupt preferences; using defaults");
        T::default()
    })
}

fn write_record<T: serde::Serialize>(
    store: &dyn PreferenceStore,
    key: &str,
    record: &T,
) -> Result<(), InfraError> {
    let json = serde_json::to_string(record)?;
    store.save(key, &json).inspect_err(|err| {
        warn!(key, error = %err, "Failed to persist preferences");
    })
}
