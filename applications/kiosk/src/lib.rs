//! Ambience Kiosk Library
//!
//! Headless kiosk driver: configuration, line commands and the glue between
//! the session coordinator and the localizer.
//!
//! This library exposes the driver components for testing purposes.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod haptics;

// Re-export commonly used types for convenience
pub use app::{localizer, render_catalog, Kiosk, Response};
pub use commands::{Command, DragPhase};
pub use config::{KioskConfig, LanguageSettings, DEFAULT_CONFIG_FILE};
pub use error::{KioskError, Result};
pub use haptics::TracingHaptics;
