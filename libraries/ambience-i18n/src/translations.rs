//! Translation tables and lookup with fallback
//!
//! Tables are nested JSON objects keyed by language code. Lookups use dotted
//! paths (`channels.kuvik`). A key missing in the current language falls back
//! to the fallback language; a key missing in both comes back unchanged so
//! the screen shows something recognizable instead of nothing.

use crate::error::{I18nError, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Built-in translation table
const BUILTIN_TABLE: &str = include_str!("../assets/translations.json");

/// Fallback language of the built-in table
pub const DEFAULT_FALLBACK: &str = "hu";

/// Key holding each language's own name
const LANGUAGE_NAME_KEY: &str = "ui.language_name";

type Table = HashMap<String, String>;

/// Localization provider
#[derive(Debug, Clone)]
pub struct Localizer {
    tables: BTreeMap<String, Table>,
    language: String,
    fallback: String,
}

impl Localizer {
    /// Localizer over the built-in table (hu, en, de, es), starting in the fallback language
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_TABLE, DEFAULT_FALLBACK)
    }

    /// Parse a translation table
    ///
    /// The top level maps language codes to nested objects of strings. The
    /// fallback language must be present.
    pub fn from_json_str(input: &str, fallback: &str) -> Result<Self> {
        let root: Map<String, Value> = serde_json::from_str(input)?;

        let mut tables = BTreeMap::new();
        for (language, value) in root {
            let Value::Object(entries) = value else {
                return Err(I18nError::InvalidTable(format!(
                    "language {language} is not an object"
                )));
            };

            let mut table = Table::new();
            flatten(&mut table, "", &entries)?;
            debug!(language = %language, keys = table.len(), "Loaded translations");
            tables.insert(language, table);
        }

        if !tables.contains_key(fallback) {
            return Err(I18nError::UnsupportedLanguage(fallback.to_string()));
        }

        Ok(Self {
            tables,
            language: fallback.to_string(),
            fallback: fallback.to_string(),
        })
    }

    /// Current language code
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Fallback language code
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Switch language; unsupported codes are ignored and return `false`
    pub fn set_language(&mut self, code: &str) -> bool {
        if !self.is_supported(code) {
            warn!("Ignoring unsupported language: {}", code);
            return false;
        }

        self.language = code.to_string();
        true
    }

    /// Change the fallback language; unsupported codes are ignored and return `false`
    pub fn set_fallback(&mut self, code: &str) -> bool {
        if !self.is_supported(code) {
            warn!("Ignoring unsupported fallback language: {}", code);
            return false;
        }

        self.fallback = code.to_string();
        true
    }

    /// Whether the table has the language
    pub fn is_supported(&self, code: &str) -> bool {
        self.tables.contains_key(code)
    }

    /// Language codes in the table, sorted
    pub fn available_languages(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Display string for `key` in the current language
    pub fn translate(&self, key: &str) -> String {
        self.lookup(&self.language, key)
            .or_else(|| self.lookup(&self.fallback, key))
            .unwrap_or(key)
            .to_string()
    }

    /// A language's own name (`Magyar`, `English`, ...), or the code itself
    pub fn language_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.lookup(code, LANGUAGE_NAME_KEY).unwrap_or(code)
    }

    fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        self.tables
            .get(language)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

fn flatten(table: &mut Table, prefix: &str, entries: &Map<String, Value>) -> Result<()> {
    for (name, value) in entries {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };

        match value {
            Value::String(text) => {
                table.insert(key, text.clone());
            }
            Value::Object(children) => flatten(table, &key, children)?,
            _ => {
                return Err(I18nError::InvalidTable(format!(
                    "{key} must be a string or an object"
                )))
            }
        }
    }

    Ok(())
}

/// Language code from a POSIX locale value (`en_US.UTF-8` -> `en`)
pub fn language_from_locale(locale: &str) -> Option<String> {
    let code: String = locale
        .split(['_', '.', '@', '-'])
        .next()?
        .to_ascii_lowercase();

    if code.is_empty() || code == "c" || code == "posix" {
        None
    } else {
        Some(code)
    }
}

/// Language of the host system (`LC_ALL`, `LC_MESSAGES`, `LANG`)
pub fn system_language() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| language_from_locale(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_four_languages_and_falls_back_to_hungarian() {
        let localizer = Localizer::builtin().unwrap();

        assert_eq!(localizer.available_languages(), vec!["de", "en", "es", "hu"]);
        assert_eq!(localizer.language(), "hu");
        assert_eq!(localizer.translate("channels.kuvik"), "Kuvik");
    }

    #[test]
    fn translates_current_language() {
        let mut localizer = Localizer::builtin().unwrap();

        assert!(localizer.set_language("en"));
        assert_eq!(localizer.translate("channels.kuvik"), "Little Owl");
        assert_eq!(localizer.translate("scenes.szikes_to"), "Salt Lake");

        assert!(localizer.set_language("de"));
        assert_eq!(localizer.translate("ui.volume"), "Lautstärke");
    }

    #[test]
    fn missing_key_falls_back_then_returns_key() {
        let mut localizer = Localizer::from_json_str(
            r#"{
                "hu": { "ui": { "volume": "Hangerő", "loading": "Betöltés..." } },
                "en": { "ui": { "volume": "Volume" } }
            }"#,
            "hu",
        )
        .unwrap();
        localizer.set_language("en");

        assert_eq!(localizer.translate("ui.volume"), "Volume");
        assert_eq!(localizer.translate("ui.loading"), "Betöltés...");
        assert_eq!(localizer.translate("ui.nope"), "ui.nope");
    }

    #[test]
    fn unsupported_language_is_ignored() {
        let mut localizer = Localizer::builtin().unwrap();

        assert!(!localizer.set_language("sr"));
        assert_eq!(localizer.language(), "hu");
    }

    #[test]
    fn fallback_can_be_changed() {
        let mut localizer = Localizer::from_json_str(
            r#"{
                "hu": { "ui": { "loading": "Betöltés..." } },
                "en": { "ui": { "loading": "Loading..." } },
                "de": { "ui": {} }
            }"#,
            "hu",
        )
        .unwrap();
        localizer.set_language("de");

        assert!(localizer.set_fallback("en"));
        assert_eq!(localizer.translate("ui.loading"), "Loading...");
        assert!(!localizer.set_fallback("xx"));
        assert_eq!(localizer.fallback(), "en");
    }

    #[test]
    fn language_names() {
        let localizer = Localizer::builtin().unwrap();

        assert_eq!(localizer.language_name("es"), "Español");
        assert_eq!(localizer.language_name("xx"), "xx");
    }

    #[test]
    fn rejects_malformed_tables() {
        assert!(matches!(
            Localizer::from_json_str(r#"{ "en": {} }"#, "hu"),
            Err(I18nError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            Localizer::from_json_str(r#"{ "hu": { "ui": 3 } }"#, "hu"),
            Err(I18nError::InvalidTable(_))
        ));
        assert!(matches!(
            Localizer::from_json_str(r#"{ "hu": "x" }"#, "hu"),
            Err(I18nError::InvalidTable(_))
        ));
        assert!(Localizer::from_json_str("not json", "hu").is_err());
    }

    #[test]
    fn parses_posix_locales() {
        assert_eq!(language_from_locale("en_US.UTF-8").as_deref(), Some("en"));
        assert_eq!(language_from_locale("de").as_deref(), Some("de"));
        assert_eq!(language_from_locale("hu-HU").as_deref(), Some("hu"));
        assert_eq!(language_from_locale("C"), None);
        assert_eq!(language_from_locale("POSIX"), None);
        assert_eq!(language_from_locale(""), None);
    }
}
