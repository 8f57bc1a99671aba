/// Ambience Kiosk - headless driver for the ambient sound mixer
use ambience_audio_desktop::{DesktopBackend, MixerOutput};
use ambience_core::Catalog;
use ambience_i18n::JsonFilePreferenceStore;
use ambience_kiosk::{localizer, render_catalog, Command, Kiosk, KioskConfig, Response, TracingHaptics};
use ambience_mixer::MixerEvent;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output layout used when no audio device is available
const HEADLESS_CHANNELS: usize = 2;
const HEADLESS_SAMPLE_RATE: u32 = 48_000;

#[derive(Parser)]
#[command(name = "ambience-kiosk")]
#[command(about = "Ambient sound-mixing kiosk", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./ambience.toml if present)
    #[arg(short, long, global = true, env = "AMBIENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kiosk, reading commands from stdin
    Run {
        /// Catalog file (overrides the configured path)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Print the localized catalog
    Catalog {
        /// Catalog file (overrides the configured path)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Language to print in
        #[arg(short, long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = KioskConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Run { catalog } => run(config, catalog).await,
        Commands::Catalog { catalog, lang } => print_catalog(&config, catalog, lang),
    }
}

async fn run(config: KioskConfig, catalog_path: Option<PathBuf>) -> anyhow::Result<()> {
    let catalog_path = catalog_path.unwrap_or_else(|| config.catalog_path.clone());
    let catalog = Arc::new(Catalog::load(&catalog_path)?);
    tracing::info!(
        "Loaded catalog {} ({} scenes)",
        catalog_path.display(),
        catalog.scene_count()
    );

    let output = match MixerOutput::open_default() {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("No audio output ({}), running silent", e);
            MixerOutput::detached(HEADLESS_CHANNELS, HEADLESS_SAMPLE_RATE)
        }
    };
    let backend = Arc::new(DesktopBackend::new(&config.asset_root, Arc::new(output)));
    let preferences = Arc::new(JsonFilePreferenceStore::new(&config.language.preference_file));

    let kiosk = Kiosk::new(
        catalog,
        config.session.clone(),
        &config.language,
        backend,
        Arc::new(TracingHaptics),
        preferences,
    )?;

    let mut events = kiosk.session().controller().subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MixerEvent::ChannelFailed { key, stage, message }) => {
                    tracing::warn!(%key, %stage, "Channel failed: {}", message);
                }
                Ok(event) => tracing::debug!(?event, "Mixer event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Mixer event log lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tracing::info!("Kiosk ready");
    println!("{}", kiosk.render_status(&kiosk.session().snapshot()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let outcome = line
            .parse::<Command>()
            .and_then(|command| kiosk.execute(command));

        match outcome {
            Ok(Response::Message(text)) => println!("{text}"),
            Ok(Response::Silent) => {}
            Ok(Response::Quit) => break,
            Err(e) => println!("error: {e}"),
        }
    }

    kiosk.shutdown().await;
    event_log.abort();
    tracing::info!("Kiosk stopped");

    Ok(())
}

fn print_catalog(
    config: &KioskConfig,
    catalog_path: Option<PathBuf>,
    lang: Option<String>,
) -> anyhow::Result<()> {
    let catalog_path = catalog_path.unwrap_or_else(|| config.catalog_path.clone());
    let catalog = Catalog::load(&catalog_path)?;

    let mut localizer = localizer(&config.language)?;
    if let Some(code) = lang {
        if !localizer.set_language(&code) {
            anyhow::bail!(
                "unsupported language {code}; available: {}",
                localizer.available_languages().join(", ")
            );
        }
    }

    print!("{}", render_catalog(&catalog, &localizer));
    Ok(())
}
