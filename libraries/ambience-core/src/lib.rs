//! Ambience Kiosk Core
//!
//! Platform-agnostic core types, collaborator traits and error handling for
//! the ambient sound kiosk.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Catalog Types**: `Catalog`, `Scene`, `ChannelDescriptor`, `ChannelKey`, `AssetRef`
//! - **Collaborator Traits**: `SoundBackend`, `HapticSink`, `PreferenceStore`
//! - **Error Handling**: Unified `AmbienceError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use ambience_core::{Catalog, ChannelKey};
//!
//! let catalog = Catalog::from_toml_str(r#"
//!     [[scenes]]
//!     name_key = "scenes.night_forest"
//!     icon = "moon"
//!     background_image = "img/night.jpg"
//!
//!     [[scenes.channels]]
//!     name_key = "channels.little_owl"
//!     audio = "mp3/little_owl.mp3"
//!     image = "img/little_owl.jpg"
//! "#).unwrap();
//!
//! let channel = catalog.channel(ChannelKey::new(0, 0)).unwrap();
//! assert_eq!(channel.audio.as_str(), "mp3/little_owl.mp3");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{AmbienceError, Result};
pub use traits::{HapticKind, HapticSink, NoopHaptics, PreferenceStore, SoundBackend};
pub use types::{AssetRef, Catalog, ChannelDescriptor, ChannelKey, Scene};
