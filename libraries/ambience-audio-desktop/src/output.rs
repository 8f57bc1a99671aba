//! Mixing output over CPAL
//!
//! Every loaded loop is a [`Voice`] in a shared [`VoiceTable`]. The device
//! callback locks the table and sums all playing voices into the output
//! buffer.
//!
//! The CPAL `Stream` is not `Send` on every platform, so a dedicated audio
//! thread builds and owns it until shutdown.

use crate::error::{AudioError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Handle to one voice in the mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(u64);

impl VoiceId {
    /// Raw id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice-{}", self.0)
    }
}

/// A looping sample buffer in the output format
#[derive(Debug, Clone)]
pub struct Voice {
    samples: Arc<Vec<f32>>,
    position: usize,
    gain: f32,
    playing: bool,
}

impl Voice {
    fn new(samples: Arc<Vec<f32>>, gain: f32) -> Self {
        Self {
            samples,
            position: 0,
            gain: gain.clamp(0.0, 1.0),
            playing: false,
        }
    }

    /// Linear gain
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Whether the voice is audible
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

/// All voices known to the mixer
#[derive(Debug, Default)]
pub struct VoiceTable {
    voices: HashMap<VoiceId, Voice>,
}

impl VoiceTable {
    fn insert(&mut self, id: VoiceId, voice: Voice) {
        self.voices.insert(id, voice);
    }

    fn get_mut(&mut self, id: VoiceId) -> Result<&mut Voice> {
        self.voices
            .get_mut(&id)
            .ok_or(AudioError::UnknownVoice(id.get()))
    }

    /// Voice by id
    pub fn get(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(&id)
    }

    /// Number of loaded voices
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether no voice is loaded
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Number of audible voices
    pub fn playing_count(&self) -> usize {
        self.voices.values().filter(|v| v.playing).count()
    }

    /// Sum every playing voice into `output`, looping at the end of each buffer
    pub fn mix_into(&mut self, output: &mut [f32]) {
        output.fill(0.0);

        for voice in self.voices.values_mut().filter(|v| v.playing) {
            let len = voice.samples.len();
            if len == 0 {
                continue;
            }

            let mut pos = voice.position % len;
            for out in output.iter_mut() {
                *out += voice.samples[pos] * voice.gain;
                pos += 1;
                if pos == len {
                    pos = 0;
                }
            }
            voice.position = pos;
        }

        for out in output.iter_mut() {
            *out = out.clamp(-1.0, 1.0);
        }
    }
}

/// Mixer feeding the default output device
///
/// Use [`MixerOutput::detached`] to run the mixer without a device (headless
/// kiosks and tests); [`render`](Self::render) then pulls samples manually.
pub struct MixerOutput {
    voices: Arc<Mutex<VoiceTable>>,
    channels: usize,
    sample_rate: u32,
    next_id: AtomicU64,
    shutdown_tx: Option<Sender<()>>,
    audio_thread: Option<JoinHandle<()>>,
}

impl MixerOutput {
    /// Open the default output device
    ///
    /// # Errors
    /// Returns an error if no audio device is found or the stream cannot start
    pub fn open_default() -> Result<Self> {
        let voices = Arc::new(Mutex::new(VoiceTable::default()));
        let (ready_tx, ready_rx) = bounded::<Result<(usize, u32)>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let table = Arc::clone(&voices);
        let audio_thread = thread::Builder::new()
            .name("ambience-audio".to_string())
            .spawn(move || Self::audio_thread_run(&table, &ready_tx, &shutdown_rx))?;

        let (channels, sample_rate) = ready_rx.recv().map_err(|_| AudioError::OutputClosed)??;

        info!(channels, sample_rate, "Audio output started");

        Ok(Self {
            voices,
            channels,
            sample_rate,
            next_id: AtomicU64::new(1),
            shutdown_tx: Some(shutdown_tx),
            audio_thread: Some(audio_thread),
        })
    }

    /// Mixer without an output device
    pub fn detached(channels: usize, sample_rate: u32) -> Self {
        Self {
            voices: Arc::new(Mutex::new(VoiceTable::default())),
            channels: channels.max(1),
            sample_rate,
            next_id: AtomicU64::new(1),
            shutdown_tx: None,
            audio_thread: None,
        }
    }

    /// Audio thread main loop: builds the stream, reports, then parks until shutdown
    fn audio_thread_run(
        voices: &Arc<Mutex<VoiceTable>>,
        ready_tx: &Sender<Result<(usize, u32)>>,
        shutdown_rx: &Receiver<()>,
    ) {
        let stream = match Self::build_stream(voices) {
            Ok((stream, channels, sample_rate)) => {
                let _ = ready_tx.send(Ok((channels, sample_rate)));
                stream
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        // Either an explicit shutdown or the sender being dropped ends the stream
        let _ = shutdown_rx.recv();
        drop(stream);
        debug!("Audio thread exiting");
    }

    fn build_stream(voices: &Arc<Mutex<VoiceTable>>) -> Result<(cpal::Stream, usize, u32)> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceNotFound)?;

        let supported = device.default_output_config()?;
        let sample_rate = supported.sample_rate();
        let config = supported.config();
        let channels = usize::from(config.channels);

        let table = Arc::clone(voices);
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                lock(&table).mix_into(data);
            },
            |err| error!("Audio stream error: {}", err),
            None,
        )?;
        stream.play()?;

        Ok((stream, channels, sample_rate))
    }

    /// Output channel count
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether a device stream is running
    pub fn is_attached(&self) -> bool {
        self.audio_thread.is_some()
    }

    /// Add a paused voice playing `samples` (interleaved, output format)
    pub fn add_voice(&self, samples: Arc<Vec<f32>>, gain: f32) -> VoiceId {
        let id = VoiceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.voices).insert(id, Voice::new(samples, gain));
        id
    }

    /// Start a voice from its current position
    pub fn start(&self, id: VoiceId) -> Result<()> {
        lock(&self.voices).get_mut(id)?.playing = true;
        Ok(())
    }

    /// Stop a voice and rewind it
    pub fn stop(&self, id: VoiceId) -> Result<()> {
        let mut voices = lock(&self.voices);
        let voice = voices.get_mut(id)?;
        voice.playing = false;
        voice.position = 0;
        Ok(())
    }

    /// Set the linear gain of a voice, clamped to 0.0 - 1.0
    pub fn set_gain(&self, id: VoiceId, gain: f32) -> Result<()> {
        lock(&self.voices).get_mut(id)?.gain = gain.clamp(0.0, 1.0);
        Ok(())
    }

    /// Remove a voice
    pub fn remove(&self, id: VoiceId) -> Result<()> {
        lock(&self.voices)
            .voices
            .remove(&id)
            .map(|_| ())
            .ok_or(AudioError::UnknownVoice(id.get()))
    }

    /// Snapshot of one voice
    pub fn voice(&self, id: VoiceId) -> Option<Voice> {
        lock(&self.voices).get(id).cloned()
    }

    /// Number of loaded voices
    pub fn voice_count(&self) -> usize {
        lock(&self.voices).len()
    }

    /// Number of audible voices
    pub fn playing_count(&self) -> usize {
        lock(&self.voices).playing_count()
    }

    /// Pull mixed samples without a device
    pub fn render(&self, output: &mut [f32]) {
        lock(&self.voices).mix_into(output);
    }
}

impl Drop for MixerOutput {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.audio_thread.take() {
            let _ = handle.join();
        }
    }
}

impl fmt::Debug for MixerOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixerOutput")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

fn lock(voices: &Mutex<VoiceTable>) -> MutexGuard<'_, VoiceTable> {
    voices.lock().unwrap_or_else(PoisonError::into_inner)
}
