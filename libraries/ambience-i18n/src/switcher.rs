//! Language switching
//!
//! Ties the localizer to the saved preference and haptic feedback: a switch
//! changes the active language, pulses a light haptic and persists the choice.

use crate::preference::LanguagePreference;
use crate::translations::Localizer;
use ambience_core::{HapticKind, HapticSink};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::info;

/// Active language of the kiosk
pub struct LanguageSwitcher {
    localizer: RwLock<Localizer>,
    preference: LanguagePreference,
    haptics: Arc<dyn HapticSink>,
}

impl LanguageSwitcher {
    /// Create a switcher; call [`restore`](Self::restore) to apply the saved language
    pub fn new(
        localizer: Localizer,
        preference: LanguagePreference,
        haptics: Arc<dyn HapticSink>,
    ) -> Self {
        Self {
            localizer: RwLock::new(localizer),
            preference,
            haptics,
        }
    }

    /// Apply the saved language if there is a supported one
    ///
    /// Returns the active language afterwards. No haptic, no save.
    pub fn restore(&self) -> String {
        let mut localizer = self.write();

        if let Some(saved) = self.preference.load() {
            if localizer.set_language(&saved) {
                info!(language = %saved, "Restored saved language");
            }
        }

        localizer.language().to_string()
    }

    /// Switch to `code`
    ///
    /// Selecting the active language does nothing. Unsupported codes are
    /// ignored. Returns whether the language changed.
    pub fn switch(&self, code: &str) -> bool {
        {
            let mut localizer = self.write();
            if localizer.language() == code || !localizer.set_language(code) {
                return false;
            }
        }

        info!(language = code, "Language switched");
        self.haptics.pulse(HapticKind::Light);
        self.preference.save(code);
        true
    }

    /// Active language code
    pub fn language(&self) -> String {
        self.read().language().to_string()
    }

    /// Display string for `key` in the active language
    pub fn translate(&self, key: &str) -> String {
        self.read().translate(key)
    }

    /// Read access to the localizer
    pub fn localizer(&self) -> RwLockReadGuard<'_, Localizer> {
        self.read()
    }

    fn read(&self) -> RwLockReadGuard<'_, Localizer> {
        self.localizer.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Localizer> {
        self.localizer.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LanguageSwitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageSwitcher")
            .field("language", &self.language())
            .finish_non_exhaustive()
    }
}
