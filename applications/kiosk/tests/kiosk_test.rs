//! Driving the kiosk through line commands

use ambience_core::{AssetRef, Catalog, NoopHaptics, PreferenceStore, SoundBackend};
use ambience_i18n::{MemoryPreferenceStore, LANGUAGE_KEY};
use ambience_kiosk::{render_catalog, Command, Kiosk, LanguageSettings, Response};
use ambience_mixer::SessionConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// ===== Helpers =====

/// Backend that loads instantly and remembers which assets play
#[derive(Default)]
struct InstantBackend {
    next: AtomicU64,
    playing: Mutex<HashMap<u64, AssetRef>>,
    loaded: Mutex<HashMap<u64, AssetRef>>,
}

impl InstantBackend {
    fn playing(&self) -> Vec<String> {
        let mut assets: Vec<String> = self
            .playing
            .lock()
            .unwrap()
            .values()
            .map(|a| a.to_string())
            .collect();
        assets.sort();
        assets
    }
}

#[async_trait]
impl SoundBackend for InstantBackend {
    type Handle = u64;

    async fn load_loop(&self, asset: &AssetRef, _initial_gain: f32) -> ambience_core::Result<u64> {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        self.loaded.lock().unwrap().insert(id, asset.clone());
        Ok(id)
    }

    async fn play(&self, handle: &u64) -> ambience_core::Result<()> {
        let asset = self.loaded.lock().unwrap().get(handle).cloned();
        if let Some(asset) = asset {
            self.playing.lock().unwrap().insert(*handle, asset);
        }
        Ok(())
    }

    async fn set_volume(&self, _handle: &u64, _gain: f32) -> ambience_core::Result<()> {
        Ok(())
    }

    async fn stop(&self, handle: &u64) -> ambience_core::Result<()> {
        self.playing.lock().unwrap().remove(handle);
        Ok(())
    }

    async fn unload(&self, handle: &u64) -> ambience_core::Result<()> {
        self.loaded.lock().unwrap().remove(handle);
        Ok(())
    }
}

fn catalog() -> Arc<Catalog> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/catalog.toml");
    Arc::new(Catalog::load(std::path::Path::new(path)).unwrap())
}

fn language(default: &str) -> LanguageSettings {
    LanguageSettings {
        default: Some(default.to_string()),
        ..LanguageSettings::default()
    }
}

fn kiosk(store: Arc<MemoryPreferenceStore>) -> (Kiosk<InstantBackend>, Arc<InstantBackend>) {
    let backend = Arc::new(InstantBackend::default());
    let kiosk = Kiosk::new(
        catalog(),
        SessionConfig::default(),
        &language("en"),
        Arc::clone(&backend),
        Arc::new(NoopHaptics),
        store,
    )
    .unwrap();
    (kiosk, backend)
}

fn run(kiosk: &Kiosk<InstantBackend>, line: &str) -> Response {
    kiosk.execute(line.parse::<Command>().unwrap()).unwrap()
}

fn message(response: Response) -> String {
    match response {
        Response::Message(text) => text,
        other => panic!("expected a message, got {other:?}"),
    }
}

// ===== Tests =====

#[test]
fn test_bundled_catalog_shape() {
    let catalog = catalog();

    assert_eq!(catalog.scene_count(), 3);
    assert!(catalog.scenes.iter().all(|s| s.channels.len() == 4));
}

#[test]
fn test_catalog_listing_is_localized() {
    let mut localizer = ambience_kiosk::localizer(&language("en")).unwrap();
    let listing = render_catalog(&catalog(), &localizer);
    assert!(listing.contains("Little Owl"), "{listing}");

    localizer.set_language("hu");
    let listing = render_catalog(&catalog(), &localizer);
    assert!(listing.contains("Kuvik"), "{listing}");
    assert!(listing.contains("mp3/kuvik.mp3"), "{listing}");
}

#[tokio::test(start_paused = true)]
async fn test_toggle_requires_start() {
    let (kiosk, backend) = kiosk(Arc::new(MemoryPreferenceStore::new()));

    assert_eq!(message(run(&kiosk, "toggle 1")), "Press start first");
    assert!(message(run(&kiosk, "status")).contains("start screen"));

    run(&kiosk, "start");
    assert!(message(run(&kiosk, "toggle 1")).ends_with(": on"));

    kiosk.session().settled().await;
    assert_eq!(backend.playing(), vec!["mp3/zugoszel.mp3"]);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_and_status() {
    let (kiosk, backend) = kiosk(Arc::new(MemoryPreferenceStore::new()));
    run(&kiosk, "start");

    let header = message(run(&kiosk, "next"));
    assert!(header.contains("(2/3)"), "{header}");

    run(&kiosk, "toggle 4");
    kiosk.session().settled().await;
    assert_eq!(backend.playing(), vec!["mp3/kuvik.mp3"]);

    let status = message(run(&kiosk, "status"));
    assert!(status.contains("[x] Little Owl"), "{status}");

    let header = message(run(&kiosk, "prev"));
    assert!(header.contains("(1/3)"), "{header}");
    kiosk.session().settled().await;
    assert!(backend.playing().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_volume_command_and_drag() {
    let (kiosk, _backend) = kiosk(Arc::new(MemoryPreferenceStore::new()));
    run(&kiosk, "start");

    assert!(message(run(&kiosk, "volume 2 40")).ends_with("40%"));

    assert_eq!(run(&kiosk, "drag 2 begin"), Response::Silent);
    assert_eq!(run(&kiosk, "drag 2 move -32"), Response::Silent);
    let line = message(run(&kiosk, "drag 2 end"));
    assert!(line.ends_with("90%"), "{line}");
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_channel_is_an_error() {
    let (kiosk, _backend) = kiosk(Arc::new(MemoryPreferenceStore::new()));
    run(&kiosk, "start");

    assert!(kiosk.execute(Command::Toggle(7)).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_language_switch_is_saved_and_restored() {
    let store = Arc::new(MemoryPreferenceStore::new());

    {
        let (kiosk, _) = kiosk(Arc::clone(&store));
        assert_eq!(kiosk.language().language(), "en");

        let reply = message(run(&kiosk, "lang de"));
        assert_eq!(reply, "Sprache: Deutsch");
        assert_eq!(run(&kiosk, "lang de"), Response::Silent);
        assert_eq!(run(&kiosk, "lang xx"), Response::Silent);
    }

    assert_eq!(store.get(LANGUAGE_KEY).unwrap().as_deref(), Some("de"));

    let (kiosk, _) = kiosk(store);
    assert_eq!(kiosk.language().language(), "de");
}

#[tokio::test(start_paused = true)]
async fn test_reset_and_quit() {
    let (kiosk, backend) = kiosk(Arc::new(MemoryPreferenceStore::new()));
    run(&kiosk, "start");
    run(&kiosk, "toggle 1");
    kiosk.session().settled().await;

    run(&kiosk, "reset");
    kiosk.session().settled().await;
    assert!(backend.playing().is_empty());
    assert!(!kiosk.session().snapshot().has_started);

    assert_eq!(run(&kiosk, "quit"), Response::Quit);
    kiosk.shutdown().await;
}
