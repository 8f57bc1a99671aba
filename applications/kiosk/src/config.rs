/// Kiosk configuration
use crate::error::{KioskError, Result};
use ambience_mixer::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, read if present
pub const DEFAULT_CONFIG_FILE: &str = "ambience.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KioskConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,

    #[serde(default)]
    pub language: LanguageSettings,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguageSettings {
    /// Startup language when nothing is saved; the system locale is tried otherwise
    #[serde(default)]
    pub default: Option<String>,

    #[serde(default = "default_fallback")]
    pub fallback: String,

    #[serde(default = "default_preference_file")]
    pub preference_file: PathBuf,
}

impl KioskConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `ambience.toml` in the working
    /// directory is read if present. Environment variables prefixed with
    /// `AMBIENCE_` override file values, with `__` between nested keys
    /// (`AMBIENCE_SESSION__IDLE_TIMEOUT_MS=90000`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(KioskError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("AMBIENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;

        if self.language.fallback.trim().is_empty() {
            return Err(KioskError::Config(
                "language.fallback must not be empty".to_string(),
            ));
        }

        if self.log_filter.trim().is_empty() {
            return Err(KioskError::Config("log_filter must not be empty".to_string()));
        }

        Ok(())
    }
}

// Default values
fn default_catalog_path() -> PathBuf {
    PathBuf::from("assets/catalog.toml")
}

fn default_asset_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_fallback() -> String {
    ambience_i18n::DEFAULT_FALLBACK.to_string()
}

fn default_preference_file() -> PathBuf {
    PathBuf::from("data/preferences.json")
}

fn default_log_filter() -> String {
    "ambience_mixer=info,ambience_kiosk=info,ambience_audio_desktop=info".to_string()
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            default: None,
            fallback: default_fallback(),
            preference_file: default_preference_file(),
        }
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            catalog_path: default_catalog_path(),
            asset_root: default_asset_root(),
            language: LanguageSettings::default(),
            log_filter: default_log_filter(),
        }
    }
}
