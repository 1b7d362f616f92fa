//! Tahfiz practice session - Main entry point
//!
//! Wires the session engine to its terminal collaborators: keyboard input
//! stands in for browser speech recognition, simulated paced playback
//! stands in for reference audio, and a renderer subscribed to the event
//! bus writes learner-facing output to stdout. Logging goes to stderr so
//! the practice text stays clean.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tahfiz_common::config::{default_data_dir, TomlConfig};
use tahfiz_common::events::EventBus;
use tahfiz_common::params::PARAMS;
use tahfiz_common::types::SurahText;
use tahfiz_session::audio::PacedAudio;
use tahfiz_session::events::EngineCommand;
use tahfiz_session::input::spawn_input_loop;
use tahfiz_session::render::spawn_renderer;
use tahfiz_session::session::{EngineConfig, SessionEngine};
use tahfiz_session::speech::KeyboardRecognition;

/// Al-Fatiha ships with the binary so a first run needs no files
const BUNDLED_PACK: &str = include_str!("../packs/al_fatiha.toml");

/// Command-line arguments for tahfiz-session
#[derive(Parser, Debug)]
#[command(name = "tahfiz-session")]
#[command(about = "Guided verse-memorization practice session")]
#[command(version)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "TAHFIZ_CONFIG")]
    config: Option<PathBuf>,

    /// Verse pack to practice (TOML); defaults to the bundled Al-Fatiha
    #[arg(short, long, env = "TAHFIZ_VERSE_PACK")]
    verses: Option<PathBuf>,

    /// First ayah of the practice range (inclusive)
    #[arg(long, default_value = "1", env = "TAHFIZ_START_AYAH")]
    start_ayah: u16,

    /// Last ayah of the practice range (inclusive); defaults to the pack's last
    #[arg(long, env = "TAHFIZ_END_AYAH")]
    end_ayah: Option<u16>,

    /// Where to write the session report
    #[arg(short, long, env = "TAHFIZ_REPORT")]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Resolve configuration before tracing init so the config file can set
    // the default log filter
    let config = TomlConfig::resolve(args.config.as_deref(), "TAHFIZ_CONFIG")
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting tahfiz-session (build {} {} {})",
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    PARAMS.apply_config(&config.practice);

    // Verse pack: CLI > config file > bundled Al-Fatiha
    let surah = match args.verses.as_ref().or(config.verse_pack.as_ref()) {
        Some(path) => SurahText::load(path)
            .with_context(|| format!("Failed to load verse pack {}", path.display()))?,
        None => SurahText::from_toml_str(BUNDLED_PACK).context("Bundled verse pack is invalid")?,
    };

    let end_ayah = args
        .end_ayah
        .or_else(|| surah.verses.last().map(|v| v.reference.ayah))
        .unwrap_or(args.start_ayah);
    let verses = surah.range(args.start_ayah, end_ayah);
    if verses.is_empty() {
        anyhow::bail!(
            "verse pack '{}' has no verses in range {}-{}",
            surah.name,
            args.start_ayah,
            end_ayah
        );
    }
    info!(
        surah = surah.number,
        start_ayah = args.start_ayah,
        end_ayah,
        verses = verses.len(),
        "verse pack loaded"
    );

    let bus = EventBus::new(*PARAMS.event_bus_capacity.read().unwrap());
    let renderer = spawn_renderer(&bus, surah.clone());

    let (commands_tx, commands_rx) = tokio::sync::mpsc::unbounded_channel();
    let (recognition, typing) = KeyboardRecognition::new(commands_tx.clone());
    let audio = PacedAudio::new(
        commands_tx.clone(),
        *PARAMS.playback_ms_per_word.read().unwrap(),
    );

    let engine = SessionEngine::new(
        &surah,
        verses,
        EngineConfig::from_params(),
        bus.clone(),
        Box::new(recognition),
        Box::new(audio),
        commands_rx,
    )
    .context("Failed to initialize session engine")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let input = spawn_input_loop(commands_tx.clone(), typing, Arc::clone(&shutdown));

    // Ctrl+C outside raw mode (e.g. SIGTERM-ish environments) also quits
    let signal_tx = commands_tx.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            let _ = signal_tx.send(EngineCommand::Quit);
        }
    });

    let report = engine.run().await;

    shutdown.store(true, Ordering::Relaxed);
    drop(commands_tx);
    if let Err(e) = input.await {
        warn!(error = %e, "input loop did not shut down cleanly");
    }
    drop(bus);
    let _ = renderer.await;

    let report_path = args.report.unwrap_or_else(|| {
        default_data_dir()
            .join("reports")
            .join(format!("session-{}.json", report.session_id))
    });
    report
        .write(&report_path)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;
    println!("Session report written to {}", report_path.display());

    Ok(())
}
