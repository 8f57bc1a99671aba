//! Session configuration

use crate::error::{MixerError, Result};
use crate::volume::Volume;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to per-channel volumes when the session resets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeResetPolicy {
    /// Leave volumes as the previous visitor set them
    #[default]
    Keep,
    /// Restore every channel to `default_volume`
    ResetToDefault,
}

/// Knob geometry and notification policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnobSettings {
    /// Length of the track along the drag axis
    #[serde(default = "default_track_length")]
    pub track_length: f32,

    /// Extent of the thumb along the drag axis
    #[serde(default = "default_thumb_extent")]
    pub thumb_extent: f32,

    /// Minimum distance (in percent) from the drag start before live changes are reported
    #[serde(default = "default_notify_step")]
    pub notify_step: u8,

    /// Snap the final drag value to the nearest multiple of this step
    #[serde(default)]
    pub snap_final_step: Option<u8>,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity period before the session resets (milliseconds)
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Minimum time between accepted toggles of the same channel (milliseconds)
    #[serde(default = "default_toggle_debounce_ms")]
    pub toggle_debounce_ms: u64,

    /// Volume of a channel that has never been adjusted
    #[serde(default = "default_volume")]
    pub default_volume: Volume,

    /// Volume handling on session reset
    #[serde(default)]
    pub volume_on_reset: VolumeResetPolicy,

    /// Refuse toggles while the channel is still loading or stopping
    #[serde(default = "default_block_toggle_while_busy")]
    pub block_toggle_while_busy: bool,

    /// Knob settings shared by every channel
    #[serde(default)]
    pub knob: KnobSettings,
}

impl SessionConfig {
    /// Idle timeout as a duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Toggle debounce window as a duration
    pub fn toggle_debounce(&self) -> Duration {
        Duration::from_millis(self.toggle_debounce_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == 0 {
            return Err(MixerError::InvalidConfig(
                "idle_timeout_ms must be greater than zero".to_string(),
            ));
        }

        self.knob.validate()
    }
}

impl KnobSettings {
    /// Validate knob settings
    pub fn validate(&self) -> Result<()> {
        if !self.track_length.is_finite() || !self.thumb_extent.is_finite() {
            return Err(MixerError::InvalidConfig(
                "knob geometry must be finite".to_string(),
            ));
        }

        if self.thumb_extent < 0.0 || self.track_length <= self.thumb_extent {
            return Err(MixerError::InvalidConfig(format!(
                "knob track_length ({}) must exceed thumb_extent ({})",
                self.track_length, self.thumb_extent
            )));
        }

        if self.notify_step == 0 || self.notify_step > 100 {
            return Err(MixerError::InvalidConfig(format!(
                "knob notify_step must be within 1..=100, got {}",
                self.notify_step
            )));
        }

        if let Some(step) = self.snap_final_step {
            if step == 0 || step > 100 {
                return Err(MixerError::InvalidConfig(format!(
                    "knob snap_final_step must be within 1..=100, got {}",
                    step
                )));
            }
        }

        Ok(())
    }

    /// Usable travel of the thumb along the track
    pub fn travel(&self) -> f32 {
        self.track_length - self.thumb_extent
    }
}

// Default values
fn default_idle_timeout_ms() -> u64 {
    60_000
}

fn default_toggle_debounce_ms() -> u64 {
    200
}

fn default_volume() -> Volume {
    Volume::new(70)
}

fn default_block_toggle_while_busy() -> bool {
    true
}

fn default_track_length() -> f32 {
    120.0
}

fn default_thumb_extent() -> f32 {
    56.0
}

fn default_notify_step() -> u8 {
    5
}

impl Default for KnobSettings {
    fn default() -> Self {
        Self {
            track_length: default_track_length(),
            thumb_extent: default_thumb_extent(),
            notify_step: default_notify_step(),
            snap_final_step: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            toggle_debounce_ms: default_toggle_debounce_ms(),
            default_volume: default_volume(),
            volume_on_reset: VolumeResetPolicy::default(),
            block_toggle_while_busy: default_block_toggle_while_busy(),
            knob: KnobSettings::default(),
        }
    }
}
