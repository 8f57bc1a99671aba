/// Core error types for Ambience Kiosk
use thiserror::Error;

/// Result type alias using `AmbienceError`
pub type Result<T> = std::result::Result<T, AmbienceError>;

/// Core error type for Ambience Kiosk
#[derive(Error, Debug)]
pub enum AmbienceError {
    /// Audio subsystem errors (load, play, stop, unload, volume)
    #[error("Audio error: {0}")]
    Audio(String),

    /// Asset could not be resolved
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Scene catalog is malformed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Preference store errors
    #[error("Preference error: {0}")]
    Preference(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl AmbienceError {
    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create a preference error
    pub fn preference(msg: impl Into<String>) -> Self {
        Self::Preference(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<toml::de::Error> for AmbienceError {
    fn from(err: toml::de::Error) -> Self {
        Self::Catalog(err.to_string())
    }
}
