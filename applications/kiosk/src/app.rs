//! Kiosk driver
//!
//! Wires the session coordinator to the localizer and turns line commands
//! into session calls and short localized replies.

use crate::commands::{Command, DragPhase};
use crate::config::LanguageSettings;
use crate::error::Result;
use ambience_core::{Catalog, HapticSink, PreferenceStore, SoundBackend};
use ambience_i18n::{system_language, LanguagePreference, LanguageSwitcher, Localizer};
use ambience_mixer::{SessionConfig, SessionCoordinator, SessionSnapshot, ToggleOutcome, Volume};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

/// What the driver should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Print a reply and keep reading
    Message(String),
    /// Nothing to print
    Silent,
    /// Leave the command loop
    Quit,
}

/// Localizer with the configured fallback and startup language
///
/// Startup language order: `language.default`, then the system locale, then
/// the fallback. A saved preference applied later by
/// [`LanguageSwitcher::restore`] wins over all of them.
pub fn localizer(settings: &LanguageSettings) -> Result<Localizer> {
    let mut localizer = Localizer::builtin()?;

    if !localizer.set_fallback(&settings.fallback) {
        warn!(
            "Fallback language {} unavailable, keeping {}",
            settings.fallback,
            localizer.fallback()
        );
    }
    let fallback = localizer.fallback().to_string();
    localizer.set_language(&fallback);

    let startup = settings
        .default
        .clone()
        .or_else(system_language)
        .filter(|code| localizer.is_supported(code));
    if let Some(code) = startup {
        localizer.set_language(&code);
    }

    Ok(localizer)
}

/// Catalog listing in the localizer's language
pub fn render_catalog(catalog: &Catalog, localizer: &Localizer) -> String {
    let mut out = String::new();

    for (index, scene) in catalog.scenes.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} {}",
            index + 1,
            scene.icon,
            localizer.translate(&scene.name_key)
        );
        for (channel, descriptor) in scene.channels.iter().enumerate() {
            let _ = writeln!(
                out,
                "   {}. {:<16} {}",
                channel + 1,
                localizer.translate(&descriptor.name_key),
                descriptor.audio
            );
        }
    }

    out
}

/// The running kiosk
pub struct Kiosk<B: SoundBackend> {
    session: SessionCoordinator<B>,
    language: LanguageSwitcher,
}

impl<B: SoundBackend> Kiosk<B> {
    /// Build the session and restore the saved language
    pub fn new(
        catalog: Arc<Catalog>,
        session: SessionConfig,
        language: &LanguageSettings,
        backend: Arc<B>,
        haptics: Arc<dyn HapticSink>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Result<Self> {
        let switcher = LanguageSwitcher::new(
            localizer(language)?,
            LanguagePreference::new(preferences),
            Arc::clone(&haptics),
        );
        let active = switcher.restore();
        info!(language = %active, "Language ready");

        let session = SessionCoordinator::new(catalog, session, backend, haptics)?;

        Ok(Self {
            session,
            language: switcher,
        })
    }

    /// The session coordinator
    pub fn session(&self) -> &SessionCoordinator<B> {
        &self.session
    }

    /// The language switcher
    pub fn language(&self) -> &LanguageSwitcher {
        &self.language
    }

    /// Run one command
    ///
    /// Out-of-range channels come back as errors; the caller reports them and
    /// keeps going.
    pub fn execute(&self, command: Command) -> Result<Response> {
        let response = match command {
            Command::Start => {
                self.session.start();
                Response::Message(self.scene_header(self.session.snapshot().scene))
            }
            Command::Next => Response::Message(self.scene_header(self.session.next_scene())),
            Command::Prev => Response::Message(self.scene_header(self.session.prev_scene())),
            Command::Toggle(index) => {
                let name = self.channel_name(index);
                match self.session.toggle_channel(index)? {
                    ToggleOutcome::Accepted { active: true } => {
                        Response::Message(format!("{name}: on"))
                    }
                    ToggleOutcome::Accepted { active: false } => {
                        Response::Message(format!("{name}: off"))
                    }
                    ToggleOutcome::Busy => Response::Message(format!(
                        "{name}: {}",
                        self.language.translate("ui.loading")
                    )),
                    ToggleOutcome::Debounced => Response::Silent,
                    ToggleOutcome::NotStarted => {
                        Response::Message("Press start first".to_string())
                    }
                }
            }
            Command::Drag { channel, phase } => {
                match phase {
                    DragPhase::Begin => self.session.begin_drag(channel)?,
                    DragPhase::Move(translation) => self.session.update_drag(channel, translation)?,
                    DragPhase::End => self.session.end_drag(channel)?,
                    DragPhase::Cancel => self.session.cancel_drag(channel)?,
                }

                if matches!(phase, DragPhase::End | DragPhase::Cancel) {
                    Response::Message(self.volume_line(channel))
                } else {
                    Response::Silent
                }
            }
            Command::Volume { channel, level } => {
                self.session
                    .set_channel_volume(channel, Volume::new(level))?;
                Response::Message(self.volume_line(channel))
            }
            Command::Scroll => {
                self.session.scroll_started();
                Response::Silent
            }
            Command::Language(code) => {
                if self.language.switch(&code) {
                    let localizer = self.language.localizer();
                    Response::Message(format!(
                        "{}: {}",
                        localizer.translate("ui.language"),
                        localizer.language_name(&code)
                    ))
                } else {
                    Response::Silent
                }
            }
            Command::Status => Response::Message(self.render_status(&self.session.snapshot())),
            Command::Reset => {
                self.session.reset();
                Response::Message("Session reset".to_string())
            }
            Command::Quit => Response::Quit,
        };

        Ok(response)
    }

    /// Tear the session down
    pub async fn shutdown(&self) {
        self.session.shutdown().await;
    }

    /// Localized view of a session snapshot
    pub fn render_status(&self, snapshot: &SessionSnapshot) -> String {
        let mut out = self.scene_header(snapshot.scene);
        if !snapshot.has_started {
            out.push_str("\n(start screen)");
            return out;
        }

        let volume_label = self.language.translate("ui.volume");
        let loading = self.language.translate("ui.loading");

        for (index, channel) in snapshot.channels.iter().enumerate() {
            let _ = write!(
                out,
                "\n{}. [{}] {:<16} {} {}",
                index + 1,
                if channel.active { "x" } else { " " },
                self.channel_name(index),
                volume_label,
                channel.volume
            );
            if channel.busy {
                let _ = write!(out, " {loading}");
            }
        }

        out
    }

    fn scene_header(&self, scene: usize) -> String {
        let catalog = self.session.catalog();
        catalog.scene(scene).map_or_else(String::new, |s| {
            format!(
                "{} {} ({}/{})",
                s.icon,
                self.language.translate(&s.name_key),
                scene + 1,
                catalog.scene_count()
            )
        })
    }

    fn channel_name(&self, index: usize) -> String {
        let scene = self.session.snapshot().scene;
        self.session
            .catalog()
            .scene(scene)
            .and_then(|s| s.channels.get(index))
            .map_or_else(
                || format!("#{}", index + 1),
                |c| self.language.translate(&c.name_key),
            )
    }

    fn volume_line(&self, index: usize) -> String {
        let snapshot = self.session.snapshot();
        let volume = snapshot
            .channels
            .get(index)
            .map_or(self.session.config().default_volume, |c| c.volume);

        format!(
            "{}: {} {}",
            self.channel_name(index),
            self.language.translate("ui.volume"),
            volume
        )
    }
}
