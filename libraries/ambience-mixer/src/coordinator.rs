//! Session coordinator
//!
//! Top-level owner of the session. Receives visitor intents (taps, drags,
//! scrolls, navigation), runs them through the debouncer and knobs, mutates
//! the session state and asks the sound controller to reconcile playback.
//!
//! Only channels of the current scene play, and nothing plays before the
//! visitor leaves the start screen. After every state change the coordinator
//! recomputes the desired playback of each channel and reconciles only the
//! channels whose desired state changed.

use crate::config::{SessionConfig, VolumeResetPolicy};
use crate::controller::SoundController;
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::idle::{IdleState, IdleTimer};
use crate::knob::{Knob, KnobEvent};
use crate::session::SessionState;
use crate::volume::Volume;
use ambience_core::{Catalog, ChannelKey, HapticKind, HapticSink, SoundBackend};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::time::Instant;
use tracing::{debug, info};

/// Result of a toggle intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The flag was flipped
    Accepted {
        /// New flag value
        active: bool,
    },
    /// Dropped: too soon after the last accepted toggle of this channel
    Debounced,
    /// Dropped: the channel is still loading or stopping
    Busy,
    /// Dropped: the visitor is still on the start screen
    NotStarted,
}

/// Read model of one channel in the current scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSnapshot {
    /// Channel key
    pub key: ChannelKey,
    /// Switched on
    pub active: bool,
    /// Current volume
    pub volume: Volume,
    /// A playback transition is in flight
    pub busy: bool,
}

/// Read model of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current scene index
    pub scene: usize,
    /// Whether the visitor left the start screen
    pub has_started: bool,
    /// Channels of the current scene
    pub channels: Vec<ChannelSnapshot>,
}

struct Inner<B: SoundBackend> {
    catalog: Arc<Catalog>,
    config: SessionConfig,
    controller: SoundController<B>,
    haptics: Arc<dyn HapticSink>,
    state: Mutex<SessionState>,
    debouncer: Mutex<Debouncer<ChannelKey>>,
    knobs: Mutex<HashMap<ChannelKey, Knob>>,
    /// Desired playback last handed to the controller
    applied: Mutex<HashMap<ChannelKey, bool>>,
    idle: IdleTimer,
}

/// Coordinator of the single mixing session
pub struct SessionCoordinator<B: SoundBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: SoundBackend> Clone for SessionCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: SoundBackend> SessionCoordinator<B> {
    /// Create a coordinator in the pre-start state
    pub fn new(
        catalog: Arc<Catalog>,
        config: SessionConfig,
        backend: Arc<B>,
        haptics: Arc<dyn HapticSink>,
    ) -> Result<Self> {
        config.validate()?;

        let inner = Arc::new_cyclic(|weak: &Weak<Inner<B>>| {
            let weak = weak.clone();
            let idle = IdleTimer::new(config.idle_timeout(), move || {
                if let Some(inner) = weak.upgrade() {
                    inner.idle_reset();
                }
            });

            Inner {
                state: Mutex::new(SessionState::new(&catalog, config.default_volume)),
                debouncer: Mutex::new(Debouncer::new(config.toggle_debounce())),
                knobs: Mutex::new(HashMap::new()),
                applied: Mutex::new(HashMap::new()),
                controller: SoundController::new(backend),
                catalog,
                config,
                haptics,
                idle,
            }
        });

        Ok(Self { inner })
    }

    /// Leave the start screen; returns whether this was a transition
    pub fn start(&self) -> bool {
        let started = lock(&self.inner.state).start();
        if started {
            info!("Session started");
            self.inner.haptics.pulse(HapticKind::Success);
        }

        self.inner.interaction();
        self.inner.sync_playback();
        started
    }

    /// Go to the next scene (wrapping); returns the new index
    pub fn next_scene(&self) -> usize {
        let scene = lock(&self.inner.state).next_scene();
        self.inner.navigated(scene);
        scene
    }

    /// Go to the previous scene (wrapping); returns the new index
    pub fn prev_scene(&self) -> usize {
        let scene = lock(&self.inner.state).prev_scene();
        self.inner.navigated(scene);
        scene
    }

    /// Toggle channel `index` of the current scene
    pub fn toggle_channel(&self, index: usize) -> Result<ToggleOutcome> {
        let key = {
            let state = lock(&self.inner.state);
            let key = state.current_key(index)?;
            if !state.has_started() {
                return Ok(ToggleOutcome::NotStarted);
            }
            key
        };

        if self.inner.config.block_toggle_while_busy && self.inner.controller.is_busy(key) {
            debug!(%key, "Toggle refused while busy");
            return Ok(ToggleOutcome::Busy);
        }

        if !lock(&self.inner.debouncer).should_accept(key, Instant::now()) {
            debug!(%key, "Toggle debounced");
            return Ok(ToggleOutcome::Debounced);
        }

        let active = lock(&self.inner.state).toggle(index)?;
        debug!(%key, active, "Channel toggled");

        self.inner.haptics.pulse(HapticKind::Medium);
        self.inner.interaction();
        self.inner.sync_playback();

        Ok(ToggleOutcome::Accepted { active })
    }

    /// Knob gesture start on channel `index` of the current scene
    pub fn begin_drag(&self, index: usize) -> Result<()> {
        self.with_knob(index, Knob::begin_drag)
    }

    /// Knob gesture update with the total translation since the start
    pub fn update_drag(&self, index: usize, translation: f32) -> Result<()> {
        self.with_knob(index, |knob| knob.update_drag(translation))
    }

    /// Knob gesture end
    pub fn end_drag(&self, index: usize) -> Result<()> {
        self.with_knob(index, Knob::end_drag)
    }

    /// Knob gesture interrupted by the system
    pub fn cancel_drag(&self, index: usize) -> Result<()> {
        self.with_knob(index, Knob::cancel_drag)
    }

    /// Programmatic volume change of channel `index` of the current scene
    ///
    /// The knob keeps its live position if a drag is in progress; the drag's
    /// final value then overrides this one.
    pub fn set_channel_volume(&self, index: usize, volume: Volume) -> Result<()> {
        let key = lock(&self.inner.state).current_key(index)?;

        if let Some(knob) = lock(&self.inner.knobs).get_mut(&key) {
            knob.set_value(volume.level());
        }
        self.inner.apply_volume(key, volume)
    }

    /// Scroll gesture start (qualifying interaction)
    pub fn scroll_started(&self) {
        self.inner.interaction();
    }

    /// Return to the initial state and silence every channel
    ///
    /// Idempotent. Does not re-arm the idle timer: the next interaction does.
    pub fn reset(&self) {
        self.inner.reset();
    }

    /// Current session read model
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = lock(&self.inner.state);

        let channels = state
            .current_keys()
            .map(|key| {
                let channel = state.channel(key).copied();
                ChannelSnapshot {
                    key,
                    active: channel.is_some_and(|c| c.active),
                    volume: channel.map_or(self.inner.config.default_volume, |c| c.volume),
                    busy: self.inner.controller.is_busy(key),
                }
            })
            .collect();

        SessionSnapshot {
            scene: state.current_scene(),
            has_started: state.has_started(),
            channels,
        }
    }

    /// Copy of the session state
    pub fn state(&self) -> SessionState {
        lock(&self.inner.state).clone()
    }

    /// Idle timer state
    pub fn idle_state(&self) -> IdleState {
        self.inner.idle.state()
    }

    /// The catalog this session runs on
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// The sound controller
    pub fn controller(&self) -> &SoundController<B> {
        &self.inner.controller
    }

    /// Wait until no playback transition is in flight
    pub async fn settled(&self) {
        self.inner.controller.settled().await;
    }

    /// Tear down: no idle callback fires afterwards and every resource is retired
    pub async fn shutdown(&self) {
        self.inner.idle.cancel();
        self.inner.controller.shutdown().await;
        info!("Session shut down");
    }

    fn with_knob<F>(&self, index: usize, gesture: F) -> Result<()>
    where
        F: FnOnce(&mut Knob) -> Vec<KnobEvent>,
    {
        let (key, volume) = {
            let state = lock(&self.inner.state);
            let key = state.current_key(index)?;
            (key, state.volume(key).unwrap_or(self.inner.config.default_volume))
        };

        let events = {
            let mut knobs = lock(&self.inner.knobs);
            let knob = match knobs.entry(key) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    entry.insert(Knob::new(volume.level(), self.inner.config.knob)?)
                }
            };
            knob.set_value(volume.level());
            gesture(knob)
        };

        for event in events {
            match event {
                KnobEvent::Interaction => self.inner.interaction(),
                KnobEvent::Haptic(kind) => self.inner.haptics.pulse(kind),
                KnobEvent::ValueChanged(level) => {
                    self.inner.apply_volume(key, Volume::new(level))?;
                }
            }
        }

        Ok(())
    }
}

impl<B: SoundBackend> Inner<B> {
    /// Qualifying interaction: restart the idle countdown (not after teardown)
    fn interaction(&self) {
        if self.controller.is_mounted() {
            self.idle.touch();
        }
    }

    fn navigated(&self, scene: usize) {
        debug!(scene, "Scene changed");
        self.haptics.pulse(HapticKind::Medium);
        self.interaction();
        self.sync_playback();
    }

    fn apply_volume(&self, key: ChannelKey, volume: Volume) -> Result<()> {
        let mut state = lock(&self.state);
        state.set_volume(key, volume)?;
        // Requested under the state lock so the controller sees session order
        self.controller.request_volume(key, volume);
        Ok(())
    }

    fn reset(&self) {
        let volumes: Vec<(ChannelKey, Volume)> = {
            let mut state = lock(&self.state);
            state.reset(self.config.volume_on_reset, self.config.default_volume);
            let volumes: Vec<(ChannelKey, Volume)> = self
                .catalog
                .keys()
                .filter_map(|key| state.volume(key).map(|volume| (key, volume)))
                .collect();

            if self.config.volume_on_reset == VolumeResetPolicy::ResetToDefault {
                for &(key, volume) in &volumes {
                    self.controller.request_volume(key, volume);
                }
            }
            volumes
        };

        {
            let mut knobs = lock(&self.knobs);
            for (key, volume) in volumes {
                if let Some(knob) = knobs.get_mut(&key) {
                    knob.set_value(volume.level());
                }
            }
        }

        lock(&self.debouncer).clear();
        self.idle.cancel();
        self.sync_playback();
    }

    fn idle_reset(&self) {
        if !lock(&self.state).has_started() {
            debug!("Idle timeout on start screen ignored");
            return;
        }

        info!("No interaction for {:?}, resetting session", self.config.idle_timeout());
        self.reset();
        self.haptics.pulse(HapticKind::Warning);
    }

    /// Reconcile every channel whose desired playback changed
    fn sync_playback(&self) {
        if !self.controller.is_mounted() {
            return;
        }

        // Held across the reconcile calls so concurrent syncs issue them in order
        let mut applied = lock(&self.applied);

        let plan: Vec<(ChannelKey, bool, Volume)> = {
            let state = lock(&self.state);
            self.catalog
                .keys()
                .filter_map(|key| {
                    let desired = state.has_started()
                        && state.current_scene() == key.scene
                        && state.is_active(key);
                    let previous = applied.get(&key).copied().unwrap_or(false);

                    (desired != previous).then(|| {
                        let volume = state.volume(key).unwrap_or(self.config.default_volume);
                        (key, desired, volume)
                    })
                })
                .collect()
        };

        for (key, desired, volume) in plan {
            let Some(channel) = self.catalog.channel(key) else {
                continue;
            };
            applied.insert(key, desired);
            self.controller
                .reconcile(key, desired, channel.audio.clone(), volume);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
