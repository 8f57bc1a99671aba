//! Ambience Desktop Audio
//!
//! Desktop implementation of [`ambience_core::SoundBackend`]:
//! - **Decoding**: Symphonia (MP3, WAV, FLAC, OGG)
//! - **Resampling**: Rubato sinc resampler to the device rate
//! - **Output**: CPAL stream mixing every loaded loop
//!
//! # Example
//!
//! ```rust,ignore
//! use ambience_audio_desktop::{DesktopBackend, MixerOutput};
//! use std::sync::Arc;
//!
//! let output = Arc::new(MixerOutput::open_default()?);
//! let backend = Arc::new(DesktopBackend::new("assets", output));
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod decoder;
pub mod error;
pub mod output;

pub use backend::DesktopBackend;
pub use decoder::{decode_file, map_channels, prepare_for_output, resample, DecodedClip};
pub use error::{AudioError, Result};
pub use output::{MixerOutput, Voice, VoiceId, VoiceTable};
