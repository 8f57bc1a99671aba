//! Ambience Mixer
//!
//! Channel lifecycle and session management for the ambient sound kiosk.
//!
//! # Components
//!
//! - [`SoundController`]: owns the playback resource of every channel and
//!   reconciles it against the desired active state under cancellation
//! - [`Knob`]: drag gesture to 0-100 value with rate-limited notifications
//! - [`IdleTimer`]: restartable inactivity timeout
//! - [`Debouncer`]: per-channel toggle rate limiting
//! - [`SessionState`] / [`SessionCoordinator`]: the single mixing session
//!
//! # Example
//!
//! ```rust,ignore
//! use ambience_mixer::{SessionConfig, SessionCoordinator};
//!
//! let session = SessionCoordinator::new(catalog, SessionConfig::default(), backend, haptics)?;
//! session.start();
//! session.toggle_channel(0)?;
//! session.settled().await;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod controller;
pub mod coordinator;
pub mod debounce;
pub mod error;
pub mod events;
pub mod idle;
pub mod knob;
pub mod session;
pub mod volume;

pub use config::{KnobSettings, SessionConfig, VolumeResetPolicy};
pub use controller::{ChannelStatus, ResourceState, SoundController};
pub use coordinator::{ChannelSnapshot, SessionCoordinator, SessionSnapshot, ToggleOutcome};
pub use debounce::Debouncer;
pub use error::{MixerError, Result};
pub use events::{FailureStage, MixerEvent};
pub use idle::{IdleState, IdleTimer};
pub use knob::{Knob, KnobEvent};
pub use session::{ChannelState, SessionState};
pub use volume::Volume;
