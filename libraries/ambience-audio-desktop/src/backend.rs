//! [`SoundBackend`] over the desktop mixer
//!
//! Assets resolve relative to an asset root. Decoded and converted loops are
//! cached per asset, so toggling a channel back on does not decode again.

use crate::decoder::{decode_file, prepare_for_output};
use crate::error::{AudioError, Result};
use crate::output::{MixerOutput, VoiceId};
use ambience_core::{AssetRef, SoundBackend};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, instrument};

/// Desktop sound backend
pub struct DesktopBackend {
    asset_root: PathBuf,
    output: Arc<MixerOutput>,
    cache: Mutex<HashMap<AssetRef, Arc<Vec<f32>>>>,
}

impl DesktopBackend {
    /// Create a backend reading assets below `asset_root`
    pub fn new(asset_root: impl Into<PathBuf>, output: Arc<MixerOutput>) -> Self {
        Self {
            asset_root: asset_root.into(),
            output,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Mixer the backend plays into
    pub fn output(&self) -> &Arc<MixerOutput> {
        &self.output
    }

    /// Asset root directory
    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Number of cached assets
    pub fn cached_assets(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Resolve an asset below the root
    ///
    /// # Errors
    /// Rejects blank, absolute and parent-relative paths
    pub fn resolve(&self, asset: &AssetRef) -> Result<PathBuf> {
        let relative = Path::new(asset.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if asset.is_empty() || escapes {
            return Err(AudioError::InvalidAssetPath(asset.to_string()));
        }

        Ok(self.asset_root.join(relative))
    }

    async fn samples_for(&self, asset: &AssetRef) -> Result<Arc<Vec<f32>>> {
        if let Some(samples) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(asset)
        {
            return Ok(Arc::clone(samples));
        }

        let path = self.resolve(asset)?;
        let channels = self.output.channels();
        let sample_rate = self.output.sample_rate();

        let samples = tokio::task::spawn_blocking(move || {
            let clip = decode_file(&path)?;
            prepare_for_output(&clip, channels, sample_rate)
        })
        .await
        .map_err(|e| AudioError::Decode(format!("decode task failed: {e}")))??;

        let samples = Arc::new(samples);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(asset.clone(), Arc::clone(&samples));

        Ok(samples)
    }
}

impl std::fmt::Debug for DesktopBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopBackend")
            .field("asset_root", &self.asset_root)
            .field("output", &self.output)
            .field("cached_assets", &self.cached_assets())
            .finish()
    }
}

#[async_trait]
impl SoundBackend for DesktopBackend {
    type Handle = VoiceId;

    #[instrument(skip(self, asset), fields(asset = %asset))]
    async fn load_loop(&self, asset: &AssetRef, initial_gain: f32) -> ambience_core::Result<VoiceId> {
        let samples = self.samples_for(asset).await?;
        let id = self.output.add_voice(samples, initial_gain);
        debug!(voice = %id, "Loaded loop");
        Ok(id)
    }

    async fn play(&self, handle: &VoiceId) -> ambience_core::Result<()> {
        Ok(self.output.start(*handle)?)
    }

    async fn set_volume(&self, handle: &VoiceId, gain: f32) -> ambience_core::Result<()> {
        Ok(self.output.set_gain(*handle, gain)?)
    }

    async fn stop(&self, handle: &VoiceId) -> ambience_core::Result<()> {
        Ok(self.output.stop(*handle)?)
    }

    async fn unload(&self, handle: &VoiceId) -> ambience_core::Result<()> {
        self.output.remove(*handle)?;
        debug!(voice = %handle, "Unloaded loop");
        Ok(())
    }
}
