//! Error types for session and mixer management

use ambience_core::{AmbienceError, ChannelKey};
use thiserror::Error;

/// Mixer errors
#[derive(Debug, Error)]
pub enum MixerError {
    /// Channel index does not exist in the current scene
    #[error("Channel out of range: {index} (scene {scene} has {count} channels)")]
    ChannelOutOfRange {
        /// Scene that was addressed
        scene: usize,
        /// Requested channel index
        index: usize,
        /// Number of channels in the scene
        count: usize,
    },

    /// Scene index does not exist in the catalog
    #[error("Scene out of range: {index} (catalog has {count} scenes)")]
    SceneOutOfRange {
        /// Requested scene index
        index: usize,
        /// Number of scenes in the catalog
        count: usize,
    },

    /// Channel key does not exist in the catalog
    #[error("Unknown channel: {0}")]
    UnknownChannel(ChannelKey),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Core error
    #[error(transparent)]
    Core(#[from] AmbienceError),
}

/// Result type for mixer operations
pub type Result<T> = std::result::Result<T, MixerError>;
