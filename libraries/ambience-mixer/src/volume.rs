//! Per-channel volume level
//!
//! Volume range is 0-100%, mapped linearly to a 0.0-1.0 gain for the
//! device audio subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Volume level (0-100), always clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Volume(u8);

impl Volume {
    /// Maximum level
    pub const MAX: Volume = Volume(100);

    /// Silence
    pub const MUTED: Volume = Volume(0);

    /// Create a volume level, clamping to 100
    pub fn new(level: u8) -> Self {
        Self(level.min(100))
    }

    /// Get current volume level (0-100)
    pub fn level(self) -> u8 {
        self.0
    }

    /// Linear gain multiplier for the audio subsystem
    pub fn gain(self) -> f32 {
        f32::from(self.0) / 100.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(70)
    }
}

impl From<u8> for Volume {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<Volume> for u8 {
    fn from(volume: Volume) -> Self {
        volume.0
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
