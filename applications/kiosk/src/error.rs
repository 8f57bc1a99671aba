/// Kiosk error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KioskError>;

#[derive(Debug, Error)]
pub enum KioskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid command: {0}")]
    Command(String),

    #[error(transparent)]
    Mixer(#[from] ambience_mixer::MixerError),

    #[error(transparent)]
    Core(#[from] ambience_core::AmbienceError),

    #[error(transparent)]
    I18n(#[from] ambience_i18n::I18nError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for KioskError {
    fn from(err: config::ConfigError) -> Self {
        KioskError::Config(err.to_string())
    }
}
