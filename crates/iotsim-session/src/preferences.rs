//! Persisted operator preferences
//!
//! One record `{email, selectedDeviceIds}` lives in a single slot of a
//! key-value substrate. The record survives restarts and is used to restore
//! the device selection when the same person is chosen again.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use iotsim_client::Device;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Name of the persisted record
pub const PREFERENCES_KEY: &str = "simulatorSettings";

/// The persisted selection of the last active person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub email: String,
    pub selected_device_ids: Vec<String>,
}

/// Storage substrate for the single preferences record
pub trait PreferenceStore: Send + Sync {
    fn get(&self) -> io::Result<Option<String>>;
    fn set(&self, value: &str) -> io::Result<()>;
    fn remove(&self) -> io::Result<()>;
}

/// Stores the record as a JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FileStore {
    fn get(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, value: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, value)
    }

    fn remove(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Keeps the record in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: RwLock::new(Some(value.into())),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self) -> io::Result<Option<String>> {
        Ok(self.value.read().clone())
    }

    fn set(&self, value: &str) -> io::Result<()> {
        *self.value.write() = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        *self.value.write() = None;
        Ok(())
    }
}

/// Reads and writes [`Preferences`] through a [`PreferenceStore`].
///
/// Storage failures are logged and otherwise ignored: losing a preference
/// write never interrupts the session.
#[derive(Clone)]
pub struct PreferencesAdapter {
    store: Arc<dyn PreferenceStore>,
}

impl PreferencesAdapter {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Overwrite the record. No-op without an active person.
    pub fn save(&self, email: Option<&str>, selected_ids: &[String]) -> Option<Preferences> {
        let email = email?;
        let prefs = Preferences {
            email: email.to_string(),
            selected_device_ids: selected_ids.to_vec(),
        };

        match serde_json::to_string(&prefs) {
            Ok(json) => {
                if let Err(e) = self.store.set(&json) {
                    warn!(error = %e, "Failed to persist preferences");
                } else {
                    debug!(email, count = selected_ids.len(), "Preferences saved");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode preferences"),
        }
        Some(prefs)
    }

    /// Read the record; absent or malformed content yields `None`
    pub fn load(&self) -> Option<Preferences> {
        let raw = match self.store.get() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read preferences");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(prefs) => Some(prefs),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed preferences");
                None
            }
        }
    }

    /// Remove the record
    pub fn clear(&self) {
        if let Err(e) = self.store.remove() {
            warn!(error = %e, "Failed to remove preferences");
        }
    }
}

/// Selection to restore for `active_email` from `saved`.
///
/// Returns the saved ids that still exist in `devices`, or `None` when the
/// record belongs to another person or none of its ids survive. `None`
/// means "keep the default (all selected)".
pub fn restore_selection(
    saved: Option<&Preferences>,
    active_email: &str,
    devices: &[Device],
) -> Option<Vec<String>> {
    let saved = saved?;
    if saved.email != active_email {
        return None;
    }

    let restored: Vec<String> = saved
        .selected_device_ids
        .iter()
        .filter(|id| devices.iter().any(|d| &d.id == *id))
        .cloned()
        .collect();

    (!restored.is_empty()).then_some(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::device;
    use pretty_assertions::assert_eq;

    fn devices() -> Vec<Device> {
        vec![device("d1"), device("d2"), device("d3")]
    }

    fn prefs(email: &str, ids: &[&str]) -> Preferences {
        Preferences {
            email: email.to_string(),
            selected_device_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_restore_filters_missing_devices() {
        let saved = prefs("a@x.com", &["d1", "d9"]);
        assert_eq!(
            restore_selection(Some(&saved), "a@x.com", &devices()),
            Some(vec!["d1".to_string()])
        );
    }

    #[test]
    fn test_restore_skips_other_person() {
        let saved = prefs("b@x.com", &["d1"]);
        assert_eq!(restore_selection(Some(&saved), "a@x.com", &devices()), None);
    }

    #[test]
    fn test_restore_skips_when_nothing_survives() {
        let saved = prefs("a@x.com", &["d8", "d9"]);
        assert_eq!(restore_selection(Some(&saved), "a@x.com", &devices()), None);
        assert_eq!(restore_selection(None, "a@x.com", &devices()), None);
    }

    #[test]
    fn test_save_requires_active_person() {
        let store = Arc::new(MemoryStore::new());
        let adapter = PreferencesAdapter::new(store.clone());

        assert!(adapter.save(None, &["d1".to_string()]).is_none());
        assert_eq!(store.get().unwrap(), None);

        adapter.save(Some("a@x.com"), &["d1".to_string()]);
        assert_eq!(
            store.get().unwrap().as_deref(),
            Some(r#"{"email":"a@x.com","selectedDeviceIds":["d1"]}"#)
        );
    }

    #[test]
    fn test_load_malformed_is_absent() {
        let adapter = PreferencesAdapter::new(Arc::new(MemoryStore::with_value("{not json")));
        assert_eq!(adapter.load(), None);
    }

    #[test]
    fn test_save_load_clear() {
        let adapter = PreferencesAdapter::new(Arc::new(MemoryStore::new()));
        adapter.save(Some("a@x.com"), &["d2".to_string(), "d1".to_string()]);
        assert_eq!(adapter.load(), Some(prefs("a@x.com", &["d2", "d1"])));

        adapter.clear();
        assert_eq!(adapter.load(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("simulatorSettings.json");

        let adapter = PreferencesAdapter::new(Arc::new(FileStore::new(&path)));
        assert_eq!(adapter.load(), None);
        adapter.save(Some("a@x.com"), &["d3".to_string()]);

        let reopened = PreferencesAdapter::new(Arc::new(FileStore::new(&path)));
        assert_eq!(reopened.load(), Some(prefs("a@x.com", &["d3"])));

        reopened.clear();
        assert!(!path.exists());
        // Removing an absent record is fine
        reopened.clear();
    }
}
