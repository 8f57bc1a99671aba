//! Ambience i18n
//!
//! Display strings for scenes, channels and UI labels, plus the persisted
//! language preference.
//!
//! # Example
//!
//! ```rust
//! use ambience_i18n::Localizer;
//!
//! let mut localizer = Localizer::builtin().unwrap();
//! localizer.set_language("en");
//! assert_eq!(localizer.translate("channels.fulemule"), "Nightingale");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod preference;
pub mod switcher;
pub mod translations;

pub use error::{I18nError, Result};
pub use preference::{
    JsonFilePreferenceStore, LanguagePreference, MemoryPreferenceStore, LANGUAGE_KEY,
};
pub use switcher::LanguageSwitcher;
pub use translations::{language_from_locale, system_language, Localizer, DEFAULT_FALLBACK};
