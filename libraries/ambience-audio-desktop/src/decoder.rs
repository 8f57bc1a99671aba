//! Asset decoding and format conversion
//!
//! Loops are decoded fully into memory once (ambient loops are short), then
//! mapped to the device channel count and resampled to the device rate.

use crate::error::{AudioError, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// -3 dB, used when folding extra source channels into the output
const FOLD_GAIN: f32 = 0.707;

/// Interleaved f32 PCM of a whole asset
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Channel count
    pub channels: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedClip {
    /// Number of frames
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Decode a whole file (MP3, WAV, FLAC, OGG, ...) with symphonia
///
/// Corrupt packets are skipped; the clip ends at the first unrecoverable error
/// after at least one packet was decoded.
pub fn decode_file(path: &Path) -> Result<DecodedClip> {
    if !path.exists() {
        return Err(AudioError::FileNotFound(path.display().to_string()));
    }

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Decode("No audio tracks found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let mut channels = track.codec_params.channels.map_or(0, |c| c.count());

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) if !samples.is_empty() => {
                warn!("Stopping decode of {} early: {}", path.display(), e);
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if channels == 0 || samples.is_empty() {
        return Err(AudioError::Decode(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }

    debug!(
        path = %path.display(),
        channels,
        sample_rate,
        frames = samples.len() / channels,
        "Decoded asset"
    );

    Ok(DecodedClip {
        samples,
        channels,
        sample_rate,
    })
}

/// Convert a clip to the output layout: map channels, then resample
pub fn prepare_for_output(clip: &DecodedClip, channels: usize, sample_rate: u32) -> Result<Vec<f32>> {
    let mapped = map_channels(&clip.samples, clip.channels, channels)?;
    resample(&mapped, channels, clip.sample_rate, sample_rate)
}

/// Map interleaved samples from `from` to `to` channels
///
/// Mono is duplicated into every output channel; anything folded down to mono
/// is averaged. Otherwise shared channels pass through, missing outputs repeat
/// the source channels and surplus inputs are folded in at -3 dB.
pub fn map_channels(samples: &[f32], from: usize, to: usize) -> Result<Vec<f32>> {
    if from == 0 || to == 0 {
        return Err(AudioError::UnsupportedChannels { from, to });
    }

    if from == to {
        return Ok(samples.to_vec());
    }

    let frames = samples.len() / from;
    let mut output = Vec::with_capacity(frames * to);

    for frame in samples.chunks_exact(from) {
        if to == 1 {
            output.push(frame.iter().sum::<f32>() / from as f32);
        } else if from == 1 {
            output.resize(output.len() + to, frame[0]);
        } else {
            let start = output.len();
            output.extend((0..to).map(|c| frame[c % from]));
            for (c, sample) in frame.iter().enumerate().skip(to) {
                let out = &mut output[start + c % to];
                *out = (*out + sample * FOLD_GAIN).clamp(-1.0, 1.0);
            }
        }
    }

    Ok(output)
}

/// Resample interleaved samples with a sinc resampler
pub fn resample(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if channels == 0 || from_rate == 0 || to_rate == 0 {
        return Err(AudioError::Resample(format!(
            "invalid conversion {from_rate} Hz -> {to_rate} Hz with {channels} channels"
        )));
    }

    let frames = samples.len() / channels;

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(to_rate) / f64::from(from_rate),
        2.0,
        params,
        frames,
        channels,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let mut deinterleaved = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (channel, sample) in deinterleaved.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    let resampled = resampler
        .process(&deinterleaved, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let output_frames = resampled.first().map_or(0, Vec::len);
    let mut interleaved = Vec::with_capacity(output_frames * channels);
    for frame in 0..output_frames {
        for channel in &resampled {
            interleaved.push(channel[frame]);
        }
    }

    Ok(interleaved)
}
