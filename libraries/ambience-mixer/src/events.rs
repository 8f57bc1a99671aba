//! Channel lifecycle events
//!
//! Broadcast by the sound controller so observers (UI, logs) can follow
//! channels without polling.

use ambience_core::ChannelKey;

/// Stage of a channel transition that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Loading the asset
    Load,
    /// Starting playback
    Play,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Play => f.write_str("play"),
        }
    }
}

/// Sound controller event
#[derive(Debug, Clone, PartialEq)]
pub enum MixerEvent {
    /// A transition started; the channel refuses toggles until it settles
    ChannelBusy(ChannelKey),

    /// The latest transition completed
    ChannelSettled {
        /// Channel
        key: ChannelKey,
        /// Whether the channel is now audible
        playing: bool,
    },

    /// The latest transition failed; the channel is silent and idle
    ChannelFailed {
        /// Channel
        key: ChannelKey,
        /// Where it failed
        stage: FailureStage,
        /// Backend error message
        message: String,
    },
}

impl MixerEvent {
    /// Channel the event refers to
    pub fn key(&self) -> ChannelKey {
        match self {
            Self::ChannelBusy(key)
            | Self::ChannelSettled { key, .. }
            | Self::ChannelFailed { key, .. } => *key,
        }
    }
}
