//! Static scene/channel catalog
//!
//! The catalog is immutable, externally supplied data: an ordered list of
//! scenes, each with an ordered list of channels. It is consumed read-only
//! by the session coordinator and the sound resource controller.

use crate::error::{AmbienceError, Result};
use crate::types::{AssetRef, ChannelKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static descriptor of one looping audio channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    /// Localization key for the display name (e.g. `channels.little_owl`)
    pub name_key: String,

    /// Looping audio asset
    pub audio: AssetRef,

    /// Illustration shown next to the channel
    pub image: AssetRef,
}

/// A named, ordered group of channels sharing a visual backdrop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Localization key for the display name (e.g. `scenes.night_forest`)
    pub name_key: String,

    /// Short icon shown in the scene header
    #[serde(default)]
    pub icon: String,

    /// Backdrop image
    pub background_image: AssetRef,

    /// Ordered channels of this scene
    #[serde(default)]
    pub channels: Vec<ChannelDescriptor>,
}

/// Ordered list of scenes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Scenes in navigation order
    pub scenes: Vec<Scene>,
}

impl Catalog {
    /// Create a validated catalog from scenes
    pub fn new(scenes: Vec<Scene>) -> Result<Self> {
        let catalog = Self { scenes };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a TOML catalog
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let catalog: Self = toml::from_str(input)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a JSON catalog
    pub fn from_json_str(input: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(input)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog file, choosing the format by extension (`.json` or `.toml`)
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            Some("toml") => Self::from_toml_str(&contents),
            other => Err(AmbienceError::catalog(format!(
                "Unsupported catalog format: {:?}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    /// Validate catalog invariants
    ///
    /// There must be at least one scene (exactly one scene is current at any
    /// time) and every asset reference must be non-blank.
    pub fn validate(&self) -> Result<()> {
        if self.scenes.is_empty() {
            return Err(AmbienceError::catalog("Catalog has no scenes"));
        }

        for (scene_index, scene) in self.scenes.iter().enumerate() {
            if scene.name_key.trim().is_empty() {
                return Err(AmbienceError::catalog(format!(
                    "Scene {} has no name key",
                    scene_index
                )));
            }

            for (channel_index, channel) in scene.channels.iter().enumerate() {
                if channel.audio.is_empty() {
                    return Err(AmbienceError::catalog(format!(
                        "Channel {} has no audio asset",
                        ChannelKey::new(scene_index, channel_index)
                    )));
                }
            }
        }

        Ok(())
    }

    /// Number of scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Get a scene by index
    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    /// Get a channel descriptor by key
    pub fn channel(&self, key: ChannelKey) -> Option<&ChannelDescriptor> {
        self.scenes
            .get(key.scene)
            .and_then(|scene| scene.channels.get(key.channel))
    }

    /// All channel keys in catalog order
    pub fn keys(&self) -> impl Iterator<Item = ChannelKey> + '_ {
        self.scenes.iter().enumerate().flat_map(|(scene_index, scene)| {
            (0..scene.channels.len()).map(move |channel| ChannelKey::new(scene_index, channel))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_SCENES: &str = r#"
        [[scenes]]
        name_key = "scenes.day_forest"
        icon = "tree"
        background_image = "img/day.jpg"

        [[scenes.channels]]
        name_key = "channels.wind"
        audio = "mp3/wind.mp3"
        image = "img/wind.jpg"

        [[scenes.channels]]
        name_key = "channels.thrush"
        audio = "mp3/thrush.mp3"
        image = "img/thrush.jpg"

        [[scenes]]
        name_key = "scenes.night_forest"
        background_image = "img/night.jpg"

        [[scenes.channels]]
        name_key = "channels.owl"
        audio = "mp3/owl.mp3"
        image = "img/owl.jpg"
    "#;

    #[test]
    fn parses_toml_catalog() {
        let catalog = Catalog::from_toml_str(TWO_SCENES).unwrap();

        assert_eq!(catalog.scene_count(), 2);
        assert_eq!(catalog.scenes[0].channels.len(), 2);
        assert_eq!(catalog.scenes[1].icon, "");
        assert_eq!(
            catalog.channel(ChannelKey::new(1, 0)).unwrap().audio.as_str(),
            "mp3/owl.mp3"
        );
    }

    #[test]
    fn keys_cover_every_channel_in_order() {
        let catalog = Catalog::from_toml_str(TWO_SCENES).unwrap();
        let keys: Vec<_> = catalog.keys().collect();

        assert_eq!(
            keys,
            vec![
                ChannelKey::new(0, 0),
                ChannelKey::new(0, 1),
                ChannelKey::new(1, 0)
            ]
        );
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let result = Catalog::new(Vec::new());
        assert!(matches!(result, Err(AmbienceError::Catalog(_))));
    }

    #[test]
    fn blank_audio_asset_is_rejected() {
        let input = r#"
            [[scenes]]
            name_key = "scenes.lake"
            background_image = "img/lake.jpg"

            [[scenes.channels]]
            name_key = "channels.coot"
            audio = ""
            image = "img/coot.jpg"
        "#;

        let result = Catalog::from_toml_str(input);
        assert!(matches!(result, Err(AmbienceError::Catalog(msg)) if msg.contains("0-0")));
    }

    #[test]
    fn out_of_range_lookups_return_none() {
        let catalog = Catalog::from_toml_str(TWO_SCENES).unwrap();

        assert!(catalog.scene(5).is_none());
        assert!(catalog.channel(ChannelKey::new(0, 9)).is_none());
        assert!(catalog.channel(ChannelKey::new(9, 0)).is_none());
    }

    #[test]
    fn loads_json_by_extension() {
        let catalog = Catalog::from_toml_str(TWO_SCENES).unwrap();
        let json = serde_json::to_string(&catalog).unwrap();

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = Catalog::load(file.path()).unwrap();
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = Catalog::load(file.path());
        assert!(matches!(result, Err(AmbienceError::Catalog(_))));
    }
}
