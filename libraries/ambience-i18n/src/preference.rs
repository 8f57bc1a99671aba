//! Language preference persistence
//!
//! The chosen language survives restarts through a [`PreferenceStore`].
//! Persistence is best effort: read and write failures are logged and the
//! caller falls back to the default language.

use ambience_core::{AmbienceError, PreferenceStore, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Store key of the language preference
pub const LANGUAGE_KEY: &str = "user-language";

/// Language preference on top of a preference store
#[derive(Clone)]
pub struct LanguagePreference {
    store: Arc<dyn PreferenceStore>,
}

impl LanguagePreference {
    /// Wrap a store
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Saved language, if any
    ///
    /// Read failures are logged and reported as "nothing saved".
    pub fn load(&self) -> Option<String> {
        match self.store.get(LANGUAGE_KEY) {
            Ok(Some(code)) if !code.trim().is_empty() => Some(code.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to load language preference: {}", e);
                None
            }
        }
    }

    /// Remember a language; failures are logged, never returned
    pub fn save(&self, code: &str) {
        match self.store.set(LANGUAGE_KEY, code) {
            Ok(()) => debug!(language = code, "Saved language preference"),
            Err(e) => warn!("Failed to save language preference: {}", e),
        }
    }
}

impl std::fmt::Debug for LanguagePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguagePreference").finish_non_exhaustive()
    }
}

/// Preferences in a JSON object file
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the original, so a crash never leaves a truncated file behind.
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePreferenceStore {
    /// Store backed by `path` (created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                AmbienceError::preference(format!(
                    "Corrupt preference file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| AmbienceError::preference("Preference path has no file name"))?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = dir.join(tmp_name);

        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(serde_json::to_string_pretty(values)?.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // A corrupt file is replaced rather than blocking every future save
        let mut values = self.read_all().unwrap_or_else(|e| {
            warn!("{}; starting over", e);
            BTreeMap::new()
        });
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }
}

/// In-memory preferences (tests, devices without storage)
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
