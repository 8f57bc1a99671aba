/// Identifier types for catalog entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a channel: `(scene index, channel index)`.
///
/// This pair keys debounce tracking, sound resource slots and per-channel
/// session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey {
    /// Index of the scene in the catalog
    pub scene: usize,
    /// Index of the channel within its scene
    pub channel: usize,
}

impl ChannelKey {
    /// Create a new channel key
    pub fn new(scene: usize, channel: usize) -> Self {
        Self { scene, channel }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.scene, self.channel)
    }
}

/// Reference to a bundled asset (audio loop or image), relative to the asset root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    /// Create a new asset reference
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference is blank
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
