//! Error types for localization

use ambience_core::AmbienceError;
use thiserror::Error;

/// Localization errors
#[derive(Debug, Error)]
pub enum I18nError {
    /// Language is not present in the translation table
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Translation table is malformed
    #[error("Invalid translation table: {0}")]
    InvalidTable(String),

    /// JSON parsing failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for localization operations
pub type Result<T> = std::result::Result<T, I18nError>;

impl From<I18nError> for AmbienceError {
    fn from(err: I18nError) -> Self {
        match err {
            I18nError::Json(e) => AmbienceError::Serialization(e),
            other => AmbienceError::InvalidInput(other.to_string()),
        }
    }
}
