//! Sound resource controller
//!
//! Owns one playback-resource slot per channel and reconciles actual playback
//! with the desired active state of each channel.
//!
//! # Cancellation
//!
//! Every `reconcile` call bumps the channel's generation. In-flight work
//! captured the generation it was issued with and compares it at each
//! checkpoint; on mismatch it releases whatever it created and unwinds
//! quietly. A later call therefore always wins, regardless of completion
//! order.
//!
//! # Serialization
//!
//! All reconciles of one channel share a lane (a `watch` channel carrying the
//! generation and the number of tasks in flight). Before loading a new
//! resource, a task waits until it is the only one left in its lane, so an
//! older resource is always fully retired before a newer one can start:
//! two resources of the same channel are never audible together.
//!
//! Lanes of different channels are independent. A backend call that never
//! returns stalls only its own channel, which then reports busy indefinitely.
//!
//! # Live volume
//!
//! Each channel has at most one volume applier task, fed by a `watch` channel
//! holding the latest requested volume. Requests overwrite each other and the
//! applier always sends the newest value, so the backend ends at the volume
//! requested last. A resource registered after a request raced its load is
//! brought to the requested volume right away.

use crate::events::{FailureStage, MixerEvent};
use crate::volume::Volume;
use ambience_core::{AssetRef, ChannelKey, SoundBackend};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Lifecycle state of a channel's playback resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceState {
    /// No resource
    #[default]
    Unloaded,
    /// A resource is being loaded
    Loading,
    /// A resource is registered and playing
    Playing,
    /// The previous resource is being retired
    Stopping,
}

/// Snapshot of one channel as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStatus {
    /// Resource lifecycle state
    pub resource: ResourceState,
    /// A transition is in flight
    pub busy: bool,
    /// Desired state of the latest reconcile
    pub desired_active: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Lane {
    generation: u64,
    inflight: usize,
}

struct ChannelSlot<H> {
    lane: Arc<watch::Sender<Lane>>,
    desired_active: bool,
    busy: bool,
    state: ResourceState,
    handle: Option<H>,
    /// Latest requested volume, watched by the channel's applier task
    volume: Option<watch::Sender<Volume>>,
}

impl<H> ChannelSlot<H> {
    fn new() -> Self {
        let (lane, _) = watch::channel(Lane::default());
        Self {
            lane: Arc::new(lane),
            desired_active: false,
            busy: false,
            state: ResourceState::Unloaded,
            handle: None,
            volume: None,
        }
    }

    fn generation(&self) -> u64 {
        self.lane.borrow().generation
    }
}

/// Why a reconcile stopped before registering a resource
#[derive(Debug)]
enum Unwind {
    Cancelled,
    Failed {
        stage: FailureStage,
        message: String,
    },
}

/// Decrements the lane's in-flight count when the task ends, however it ends
struct InflightGuard {
    lane: Arc<watch::Sender<Lane>>,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.lane.send_modify(|lane| {
            lane.inflight = lane.inflight.saturating_sub(1);
        });
    }
}

struct Inner<B: SoundBackend> {
    backend: Arc<B>,
    slots: Mutex<HashMap<ChannelKey, ChannelSlot<B::Handle>>>,
    mounted: AtomicBool,
    events: broadcast::Sender<MixerEvent>,
}

/// Per-channel playback resource controller
///
/// The only component that calls playback primitives on the backend.
pub struct SoundController<B: SoundBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: SoundBackend> Clone for SoundController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: SoundBackend> SoundController<B> {
    /// Create a controller driving `backend`
    pub fn new(backend: Arc<B>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                backend,
                slots: Mutex::new(HashMap::new()),
                mounted: AtomicBool::new(true),
                events,
            }),
        }
    }

    /// Bring the channel's playback in line with `desired_active`
    ///
    /// Fire-and-forget: the transition runs on a spawned task. The returned
    /// handle may be awaited (tests do) but callers need not. Must be called
    /// from within a Tokio runtime.
    pub fn reconcile(
        &self,
        key: ChannelKey,
        desired_active: bool,
        asset: AssetRef,
        volume: Volume,
    ) -> JoinHandle<()> {
        if !self.is_mounted() {
            debug!(%key, "Reconcile after shutdown ignored");
            return tokio::spawn(async {});
        }

        let (generation, lane, retired) = {
            let mut slots = self.inner.lock_slots();
            let slot = slots.entry(key).or_insert_with(ChannelSlot::new);

            slot.lane.send_modify(|lane| {
                lane.generation = lane.generation.wrapping_add(1);
                lane.inflight += 1;
            });
            slot.desired_active = desired_active;
            slot.busy = true;

            let retired = slot.handle.take();
            slot.state = if retired.is_some() {
                ResourceState::Stopping
            } else if desired_active {
                ResourceState::Loading
            } else {
                ResourceState::Unloaded
            };

            (slot.generation(), Arc::clone(&slot.lane), retired)
        };

        debug!(%key, generation, desired_active, "Reconcile issued");
        self.inner.emit(MixerEvent::ChannelBusy(key));

        let guard = InflightGuard {
            lane: Arc::clone(&lane),
        };
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let outcome = inner
                .transition(key, generation, &lane, desired_active, &asset, volume, retired)
                .await;
            inner.settle(key, generation, outcome);
            drop(guard);
        })
    }

    /// Record the channel's volume and hand it to the channel's applier
    ///
    /// Returns immediately. Requests for one channel reach the backend in
    /// order and only the newest pending one is sent. The recorded volume is
    /// also used for the next resource loaded on the channel. Must be called
    /// from within a Tokio runtime.
    pub fn request_volume(&self, key: ChannelKey, volume: Volume) {
        if !self.is_mounted() {
            return;
        }

        let mut slots = self.inner.lock_slots();
        let slot = slots.entry(key).or_insert_with(ChannelSlot::new);

        if let Some(target) = &slot.volume {
            target.send_replace(volume);
            return;
        }

        let (target, rx) = watch::channel(volume);
        slot.volume = Some(target);
        tokio::spawn(run_volume_applier(Arc::downgrade(&self.inner), key, rx));
    }

    /// Apply a new volume to the channel's live resource
    ///
    /// Never creates or destroys resources. Does nothing unless the channel
    /// is active and a resource is registered. Backend failures are logged.
    /// Returns whether the volume reached a resource.
    pub async fn apply_volume(&self, key: ChannelKey, volume: Volume) -> bool {
        self.inner.push_volume(key, volume).await
    }

    /// Current status of a channel
    pub fn status(&self, key: ChannelKey) -> ChannelStatus {
        self.inner
            .lock_slots()
            .get(&key)
            .map(|slot| ChannelStatus {
                resource: slot.state,
                busy: slot.busy,
                desired_active: slot.desired_active,
            })
            .unwrap_or_default()
    }

    /// Whether a transition is in flight for the channel
    pub fn is_busy(&self, key: ChannelKey) -> bool {
        self.status(key).busy
    }

    /// Whether a resource is registered for the channel
    pub fn registered(&self, key: ChannelKey) -> bool {
        self.inner
            .lock_slots()
            .get(&key)
            .is_some_and(|slot| slot.handle.is_some())
    }

    /// Number of channels with a registered resource
    pub fn registered_count(&self) -> usize {
        self.inner
            .lock_slots()
            .values()
            .filter(|slot| slot.handle.is_some())
            .count()
    }

    /// Wait until no transition is in flight on any channel
    pub async fn settled(&self) {
        let lanes: Vec<watch::Receiver<Lane>> = self
            .inner
            .lock_slots()
            .values()
            .map(|slot| slot.lane.subscribe())
            .collect();

        for mut lane in lanes {
            // Only fails if the lane was dropped, which means it is idle
            let _ = lane.wait_for(|lane| lane.inflight == 0).await.map(|_| ());
        }
    }

    /// Subscribe to channel lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<MixerEvent> {
        self.inner.events.subscribe()
    }

    /// Whether the controller still accepts work
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Tear down: invalidate all in-flight work and retire every resource
    ///
    /// In-flight transitions observe the teardown at their next checkpoint and
    /// release what they created. Later reconciles are ignored.
    pub async fn shutdown(&self) {
        if !self.inner.mounted.swap(false, Ordering::SeqCst) {
            return;
        }

        let retired: Vec<(ChannelKey, B::Handle)> = {
            let mut slots = self.inner.lock_slots();
            slots
                .iter_mut()
                .filter_map(|(key, slot)| {
                    slot.lane.send_modify(|lane| {
                        lane.generation = lane.generation.wrapping_add(1);
                    });
                    slot.desired_active = false;
                    slot.busy = false;
                    slot.state = ResourceState::Unloaded;
                    slot.volume = None;
                    slot.handle.take().map(|handle| (*key, handle))
                })
                .collect()
        };

        info!("Sound controller shutting down, retiring {} resources", retired.len());

        for (key, handle) in retired {
            self.inner.retire(key, &handle).await;
        }
    }
}

impl<B: SoundBackend> Inner<B> {
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<ChannelKey, ChannelSlot<B::Handle>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn requested_volume(&self, key: ChannelKey) -> Option<Volume> {
        self.lock_slots()
            .get(&key)
            .and_then(|slot| slot.volume.as_ref())
            .map(|target| *target.borrow())
    }

    async fn push_volume(&self, key: ChannelKey, volume: Volume) -> bool {
        let handle = {
            let slots = self.lock_slots();
            slots
                .get(&key)
                .filter(|slot| slot.desired_active)
                .and_then(|slot| slot.handle.clone())
        };

        let Some(handle) = handle else {
            return false;
        };

        match self.backend.set_volume(&handle, volume.gain()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%key, "Failed to apply volume: {}", e);
                false
            }
        }
    }

    fn emit(&self, event: MixerEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn checkpoint(&self, lane: &watch::Sender<Lane>, generation: u64) -> Result<(), Unwind> {
        if self.mounted.load(Ordering::SeqCst) && lane.borrow().generation == generation {
            Ok(())
        } else {
            Err(Unwind::Cancelled)
        }
    }

    fn set_state(&self, key: ChannelKey, generation: u64, state: ResourceState) {
        let mut slots = self.lock_slots();
        if let Some(slot) = slots.get_mut(&key) {
            if slot.generation() == generation {
                slot.state = state;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn transition(
        &self,
        key: ChannelKey,
        generation: u64,
        lane: &watch::Sender<Lane>,
        desired_active: bool,
        asset: &AssetRef,
        volume: Volume,
        retired: Option<B::Handle>,
    ) -> Result<bool, Unwind> {
        // The old resource may be bound to another asset: always retire it
        if let Some(handle) = retired {
            self.retire(key, &handle).await;
        }
        self.checkpoint(lane, generation)?;

        if !desired_active {
            return Ok(false);
        }

        // Wait for older tasks of this lane to finish unwinding
        let mut waiter = lane.subscribe();
        let _ = waiter
            .wait_for(|lane| lane.generation != generation || lane.inflight == 1)
            .await
            .map(|_| ());
        self.checkpoint(lane, generation)?;

        self.set_state(key, generation, ResourceState::Loading);
        let volume = self.requested_volume(key).unwrap_or(volume);
        let handle = self
            .backend
            .load_loop(asset, volume.gain())
            .await
            .map_err(|e| Unwind::Failed {
                stage: FailureStage::Load,
                message: e.to_string(),
            })?;

        if let Err(unwind) = self.checkpoint(lane, generation) {
            self.release(key, &handle).await;
            return Err(unwind);
        }

        if let Err(e) = self.backend.play(&handle).await {
            self.release(key, &handle).await;
            return Err(Unwind::Failed {
                stage: FailureStage::Play,
                message: e.to_string(),
            });
        }

        if let Err(unwind) = self.checkpoint(lane, generation) {
            self.retire(key, &handle).await;
            return Err(unwind);
        }

        // Register only if still current; decided under the slot lock so a
        // concurrent reconcile either sees the handle or invalidates us first
        let leftover = {
            let mut slots = self.lock_slots();
            match slots.get_mut(&key) {
                Some(slot)
                    if slot.generation() == generation && self.mounted.load(Ordering::SeqCst) =>
                {
                    slot.handle = Some(handle);
                    slot.state = ResourceState::Playing;
                    // A request that raced the load reaches the new resource now
                    if let Some(target) = &slot.volume {
                        let stale = *target.borrow() != volume;
                        if stale {
                            target.send_modify(|_| {});
                        }
                    }
                    None
                }
                _ => Some(handle),
            }
        };

        match leftover {
            None => Ok(true),
            Some(handle) => {
                self.retire(key, &handle).await;
                Err(Unwind::Cancelled)
            }
        }
    }

    /// Stop and release; failures are logged and otherwise ignored
    async fn retire(&self, key: ChannelKey, handle: &B::Handle) {
        if let Err(e) = self.backend.stop(handle).await {
            warn!(%key, ?handle, "Failed to stop resource: {}", e);
        }
        self.release(key, handle).await;
    }

    async fn release(&self, key: ChannelKey, handle: &B::Handle) {
        if let Err(e) = self.backend.unload(handle).await {
            warn!(%key, ?handle, "Failed to unload resource: {}", e);
        }
    }

    fn settle(&self, key: ChannelKey, generation: u64, outcome: Result<bool, Unwind>) {
        {
            let mut slots = self.lock_slots();
            let Some(slot) = slots.get_mut(&key) else {
                return;
            };

            if slot.generation() != generation {
                debug!(%key, generation, "Superseded transition unwound");
                return;
            }

            slot.busy = false;
            if !matches!(outcome, Ok(true)) {
                slot.state = ResourceState::Unloaded;
            }
        }

        match outcome {
            Ok(playing) => {
                debug!(%key, generation, playing, "Channel settled");
                self.emit(MixerEvent::ChannelSettled { key, playing });
            }
            Err(Unwind::Cancelled) => {
                debug!(%key, generation, "Transition cancelled");
            }
            Err(Unwind::Failed { stage, message }) => {
                error!(%key, generation, %stage, "Channel transition failed: {}", message);
                self.emit(MixerEvent::ChannelFailed {
                    key,
                    stage,
                    message,
                });
            }
        }
    }
}

/// Sends the newest requested volume of one channel until the controller goes away
async fn run_volume_applier<B: SoundBackend>(
    inner: Weak<Inner<B>>,
    key: ChannelKey,
    mut target: watch::Receiver<Volume>,
) {
    loop {
        let volume = *target.borrow_and_update();
        match inner.upgrade() {
            Some(inner) => {
                inner.push_volume(key, volume).await;
            }
            None => break,
        }

        if target.changed().await.is_err() {
            break;
        }
    }

    debug!(%key, "Volume applier stopped");
}
