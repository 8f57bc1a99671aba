//! Session state
//!
//! Pure data: current scene, started flag and per-channel `{active, volume}`
//! for every scene of the catalog. No I/O, no timers.

use crate::config::VolumeResetPolicy;
use crate::error::{MixerError, Result};
use crate::volume::Volume;
use ambience_core::{Catalog, ChannelKey};

/// Session-mutable state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelState {
    /// Whether the visitor switched the channel on
    pub active: bool,
    /// Channel volume
    pub volume: Volume,
}

/// State of the single mixing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    current_scene: usize,
    has_started: bool,
    channels: Vec<Vec<ChannelState>>,
}

impl SessionState {
    /// Initial (pre-start) state shaped after `catalog`
    pub fn new(catalog: &Catalog, default_volume: Volume) -> Self {
        let channels = catalog
            .scenes
            .iter()
            .map(|scene| {
                vec![
                    ChannelState {
                        active: false,
                        volume: default_volume,
                    };
                    scene.channels.len()
                ]
            })
            .collect();

        Self {
            current_scene: 0,
            has_started: false,
            channels,
        }
    }

    /// Index of the current scene
    pub fn current_scene(&self) -> usize {
        self.current_scene
    }

    /// Whether the visitor left the start screen
    pub fn has_started(&self) -> bool {
        self.has_started
    }

    /// Number of scenes
    pub fn scene_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of channels in `scene` (0 for unknown scenes)
    pub fn channel_count(&self, scene: usize) -> usize {
        self.channels.get(scene).map_or(0, Vec::len)
    }

    /// Leave the start screen; returns whether this was a transition
    pub fn start(&mut self) -> bool {
        let transitioned = !self.has_started;
        self.has_started = true;
        transitioned
    }

    /// Advance to the next scene, wrapping to the first
    pub fn next_scene(&mut self) -> usize {
        let count = self.scene_count();
        if count > 0 {
            self.current_scene = (self.current_scene + 1) % count;
        }
        self.current_scene
    }

    /// Go back to the previous scene, wrapping to the last
    pub fn prev_scene(&mut self) -> usize {
        let count = self.scene_count();
        if count > 0 {
            self.current_scene = (self.current_scene + count - 1) % count;
        }
        self.current_scene
    }

    /// Jump to a scene
    pub fn go_to_scene(&mut self, index: usize) -> Result<()> {
        if index >= self.scene_count() {
            return Err(MixerError::SceneOutOfRange {
                index,
                count: self.scene_count(),
            });
        }

        self.current_scene = index;
        Ok(())
    }

    /// Key of channel `index` in the current scene
    pub fn current_key(&self, index: usize) -> Result<ChannelKey> {
        let count = self.channel_count(self.current_scene);
        if index >= count {
            return Err(MixerError::ChannelOutOfRange {
                scene: self.current_scene,
                index,
                count,
            });
        }

        Ok(ChannelKey::new(self.current_scene, index))
    }

    /// Flip channel `index` of the current scene; returns the new flag
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let key = self.current_key(index)?;
        let channel = self.channel_mut(key)?;
        channel.active = !channel.active;
        Ok(channel.active)
    }

    /// State of a channel
    pub fn channel(&self, key: ChannelKey) -> Option<&ChannelState> {
        self.channels.get(key.scene)?.get(key.channel)
    }

    /// Whether a channel is switched on (false for unknown keys)
    pub fn is_active(&self, key: ChannelKey) -> bool {
        self.channel(key).is_some_and(|channel| channel.active)
    }

    /// Volume of a channel
    pub fn volume(&self, key: ChannelKey) -> Option<Volume> {
        self.channel(key).map(|channel| channel.volume)
    }

    /// Change the volume of a channel
    pub fn set_volume(&mut self, key: ChannelKey, volume: Volume) -> Result<()> {
        self.channel_mut(key)?.volume = volume;
        Ok(())
    }

    /// Keys of the current scene's channels
    pub fn current_keys(&self) -> impl Iterator<Item = ChannelKey> + '_ {
        let scene = self.current_scene;
        (0..self.channel_count(scene)).map(move |channel| ChannelKey::new(scene, channel))
    }

    /// Return to the initial state
    ///
    /// Clears every flag in every scene, goes back to scene 0 and the start
    /// screen. Volumes follow `policy`. Idempotent.
    pub fn reset(&mut self, policy: VolumeResetPolicy, default_volume: Volume) {
        self.current_scene = 0;
        self.has_started = false;

        for channel in self.channels.iter_mut().flatten() {
            channel.active = false;
            if policy == VolumeResetPolicy::ResetToDefault {
                channel.volume = default_volume;
            }
        }
    }

    fn channel_mut(&mut self, key: ChannelKey) -> Result<&mut ChannelState> {
        self.channels
            .get_mut(key.scene)
            .and_then(|scene| scene.get_mut(key.channel))
            .ok_or(MixerError::UnknownChannel(key))
    }
}
