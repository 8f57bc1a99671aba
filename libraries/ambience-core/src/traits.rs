/// Collaborator traits for Ambience Kiosk
use crate::error::Result;
use crate::types::AssetRef;
use async_trait::async_trait;
use std::fmt::Debug;

/// Device audio subsystem
///
/// The only true "wire" boundary of the kiosk. Implementers own the actual
/// playback units; callers only ever see opaque handles.
///
/// Every operation may suspend while the subsystem completes I/O. No timeouts
/// are imposed by callers: a hanging operation stalls only the channel that
/// issued it.
#[async_trait]
pub trait SoundBackend: Send + Sync + 'static {
    /// Opaque handle to one loaded, loopable, volume-adjustable playback unit
    type Handle: Clone + Debug + Send + Sync + 'static;

    /// Load an asset into a fresh resource configured for infinite looping
    ///
    /// # Arguments
    /// * `asset` - Asset to load
    /// * `initial_gain` - Linear gain (0.0 - 1.0) applied from the first sample
    ///
    /// # Errors
    /// Returns an error if the asset cannot be found or decoded
    async fn load_loop(&self, asset: &AssetRef, initial_gain: f32) -> Result<Self::Handle>;

    /// Start playback of a loaded resource
    async fn play(&self, handle: &Self::Handle) -> Result<()>;

    /// Change the linear gain (0.0 - 1.0) of a resource
    async fn set_volume(&self, handle: &Self::Handle, gain: f32) -> Result<()>;

    /// Stop playback of a resource (the resource stays loaded)
    async fn stop(&self, handle: &Self::Handle) -> Result<()>;

    /// Release a resource; the handle must not be used afterwards
    async fn unload(&self, handle: &Self::Handle) -> Result<()>;
}

/// Kind of haptic pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticKind {
    /// Light impact (knob drag start/end, language switch)
    Light,
    /// Medium impact (channel toggle, scene navigation)
    Medium,
    /// Success notification (session start)
    Success,
    /// Warning notification (idle reset)
    Warning,
}

/// Haptic feedback sink
///
/// Fire-and-forget: implementations swallow their own failures.
pub trait HapticSink: Send + Sync {
    /// Emit a haptic pulse
    fn pulse(&self, kind: HapticKind);
}

/// Haptic sink for devices without a vibration motor
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHaptics;

impl HapticSink for NoopHaptics {
    fn pulse(&self, _kind: HapticKind) {}
}

/// Persisted key-value preference store
///
/// Used only for the language preference; never by the audio core.
pub trait PreferenceStore: Send + Sync {
    /// Read a preference
    ///
    /// Returns `Ok(None)` if the key has never been set
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a preference
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
