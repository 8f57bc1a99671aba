//! Shared test helpers: scripted sound backend, recording haptics, catalogs

#![allow(dead_code)]

use ambience_core::{
    AmbienceError, AssetRef, Catalog, ChannelDescriptor, HapticKind, HapticSink, Result, Scene,
    SoundBackend,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// ===== Fake Sound Backend =====

/// Opaque handle issued by [`FakeBackend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeHandle(pub u64);

#[derive(Debug, Clone)]
pub struct FakeResource {
    pub asset: String,
    pub playing: bool,
    pub gain: f32,
}

#[derive(Debug, Default)]
pub struct FakeState {
    /// Per-asset load latency, consumed one per load (falls back to `default_delay`)
    pub load_delays: HashMap<String, VecDeque<Duration>>,
    pub default_delay: Duration,
    pub fail_load: HashSet<String>,
    pub fail_play: HashSet<String>,
    pub hang_load: HashSet<String>,
    pub fail_stop: bool,
    pub fail_unload: bool,

    /// Loaded and not yet unloaded
    pub resources: HashMap<u64, FakeResource>,
    /// Every resource that was ever started
    pub played: Vec<u64>,
    /// Every load, in order: (handle, asset, initial gain)
    pub loads: Vec<(u64, String, f32)>,
    /// Every live volume change: (handle, gain)
    pub volumes: Vec<(u64, f32)>,
    /// Highest number of simultaneously playing resources per asset
    pub max_overlap: HashMap<String, usize>,
}

/// In-memory sound backend with scripted latency and failure injection
#[derive(Debug, Default)]
pub struct FakeBackend {
    next_id: AtomicU64,
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_default_delay(self: &Arc<Self>, delay: Duration) -> Arc<Self> {
        self.state().default_delay = delay;
        Arc::clone(self)
    }

    pub fn script_load_delays(&self, asset: &str, delays: &[Duration]) {
        self.state()
            .load_delays
            .insert(asset.to_string(), delays.iter().copied().collect());
    }

    pub fn fail_load(&self, asset: &str) {
        self.state().fail_load.insert(asset.to_string());
    }

    pub fn fail_play(&self, asset: &str) {
        self.state().fail_play.insert(asset.to_string());
    }

    pub fn hang_load(&self, asset: &str) {
        self.state().hang_load.insert(asset.to_string());
    }

    pub fn live_count(&self) -> usize {
        self.state().resources.len()
    }

    pub fn playing_assets(&self) -> Vec<String> {
        let mut assets: Vec<String> = self
            .state()
            .resources
            .values()
            .filter(|r| r.playing)
            .map(|r| r.asset.clone())
            .collect();
        assets.sort();
        assets
    }

    pub fn max_overlap(&self, asset: &str) -> usize {
        self.state().max_overlap.get(asset).copied().unwrap_or(0)
    }

    pub fn was_played(&self, handle: u64) -> bool {
        self.state().played.contains(&handle)
    }

    pub fn last_volume(&self) -> Option<(u64, f32)> {
        self.state().volumes.last().copied()
    }
}

#[async_trait]
impl SoundBackend for FakeBackend {
    type Handle = FakeHandle;

    async fn load_loop(&self, asset: &AssetRef, initial_gain: f32) -> Result<FakeHandle> {
        let (delay, hang) = {
            let mut state = self.state();
            let scripted = state
                .load_delays
                .get_mut(asset.as_str())
                .and_then(VecDeque::pop_front);
            (
                scripted.unwrap_or(state.default_delay),
                state.hang_load.contains(asset.as_str()),
            )
        };

        if hang {
            std::future::pending::<()>().await;
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.fail_load.contains(asset.as_str()) {
            return Err(AmbienceError::AssetNotFound(asset.to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        state.loads.push((id, asset.to_string(), initial_gain));
        state.resources.insert(
            id,
            FakeResource {
                asset: asset.to_string(),
                playing: false,
                gain: initial_gain,
            },
        );
        Ok(FakeHandle(id))
    }

    async fn play(&self, handle: &FakeHandle) -> Result<()> {
        let mut state = self.state();
        let asset = match state.resources.get(&handle.0) {
            Some(resource) => resource.asset.clone(),
            None => return Err(AmbienceError::audio(format!("unknown handle {}", handle.0))),
        };

        if state.fail_play.contains(&asset) {
            return Err(AmbienceError::audio("device busy"));
        }

        if let Some(resource) = state.resources.get_mut(&handle.0) {
            resource.playing = true;
        }
        state.played.push(handle.0);

        let overlap = state
            .resources
            .values()
            .filter(|r| r.playing && r.asset == asset)
            .count();
        let max = state.max_overlap.entry(asset).or_insert(0);
        *max = (*max).max(overlap);
        Ok(())
    }

    async fn set_volume(&self, handle: &FakeHandle, gain: f32) -> Result<()> {
        let mut state = self.state();
        let Some(resource) = state.resources.get_mut(&handle.0) else {
            return Err(AmbienceError::audio(format!("unknown handle {}", handle.0)));
        };
        resource.gain = gain;
        state.volumes.push((handle.0, gain));
        Ok(())
    }

    async fn stop(&self, handle: &FakeHandle) -> Result<()> {
        let mut state = self.state();
        if state.fail_stop {
            return Err(AmbienceError::audio("stop failed"));
        }
        if let Some(resource) = state.resources.get_mut(&handle.0) {
            resource.playing = false;
        }
        Ok(())
    }

    async fn unload(&self, handle: &FakeHandle) -> Result<()> {
        let mut state = self.state();
        if state.fail_unload {
            return Err(AmbienceError::audio("unload failed"));
        }
        state
            .resources
            .remove(&handle.0)
            .map(|_| ())
            .ok_or_else(|| AmbienceError::audio(format!("unknown handle {}", handle.0)))
    }
}

// ===== Haptics =====

#[derive(Debug, Default)]
pub struct RecordingHaptics {
    pulses: Mutex<Vec<HapticKind>>,
}

impl RecordingHaptics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pulses(&self) -> Vec<HapticKind> {
        self.pulses.lock().unwrap().clone()
    }

    pub fn count(&self, kind: HapticKind) -> usize {
        self.pulses().iter().filter(|k| **k == kind).count()
    }
}

impl HapticSink for RecordingHaptics {
    fn pulse(&self, kind: HapticKind) {
        self.pulses.lock().unwrap().push(kind);
    }
}

// ===== Catalog =====

pub fn asset(scene: usize, channel: usize) -> String {
    format!("mp3/s{scene}c{channel}.mp3")
}

/// Catalog with the given number of channels per scene
pub fn catalog(shape: &[usize]) -> Catalog {
    let scenes = shape
        .iter()
        .enumerate()
        .map(|(s, &count)| Scene {
            name_key: format!("scenes.scene_{s}"),
            icon: "leaf".to_string(),
            background_image: AssetRef::new(format!("img/scene_{s}.jpg")),
            channels: (0..count)
                .map(|c| ChannelDescriptor {
                    name_key: format!("channels.channel_{s}_{c}"),
                    audio: AssetRef::new(asset(s, c)),
                    image: AssetRef::new(format!("img/s{s}c{c}.jpg")),
                })
                .collect(),
        })
        .collect();

    Catalog::new(scenes).unwrap()
}

/// Three scenes shaped like the installation (4, 4 and 3 channels)
pub fn kiosk_catalog() -> Arc<Catalog> {
    Arc::new(catalog(&[4, 4, 3]))
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Let spawned fire-and-forget tasks run (advances the paused clock by 1ms)
pub async fn flush() {
    tokio::time::sleep(ms(1)).await;
}
