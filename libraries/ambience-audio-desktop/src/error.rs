//! Desktop audio errors

use ambience_core::AmbienceError;
use thiserror::Error;

/// Result type for desktop audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Desktop audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// Device not found
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to start stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Audio thread is gone
    #[error("Audio output closed")]
    OutputClosed,

    /// Asset file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Asset path escapes the asset root
    #[error("Invalid asset path: {0}")]
    InvalidAssetPath(String),

    /// Decoding failed
    #[error("Decode error: {0}")]
    Decode(String),

    /// Sample rate conversion failed
    #[error("Sample rate conversion error: {0}")]
    Resample(String),

    /// Channel layout cannot be mapped
    #[error("Unsupported channel mapping: {from} -> {to}")]
    UnsupportedChannels {
        /// Source channel count
        from: usize,
        /// Target channel count
        to: usize,
    },

    /// Voice handle is not (or no longer) in the voice table
    #[error("Unknown voice: {0}")]
    UnknownVoice(u64),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::Decode(err.to_string())
    }
}

impl From<AudioError> for AmbienceError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::FileNotFound(path) => AmbienceError::AssetNotFound(path),
            AudioError::InvalidAssetPath(path) => {
                AmbienceError::invalid_input(format!("Invalid asset path: {path}"))
            }
            other => AmbienceError::audio(other.to_string()),
        }
    }
}
