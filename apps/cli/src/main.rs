//! Live transcription CLI.

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use habla_application::{Session, SessionConfig};
use habla_broadcast::BroadcastConfig;
use habla_queue::StreamItem;
use habla_stt::{WhisperEngine, KNOWN_MODEL_SIZES};

use crate::render::Renderer;

/// Near real-time microphone transcription
#[derive(Parser)]
#[command(name = "habla")]
#[command(about = "Near real-time microphone transcription", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start live transcription from a microphone
    Run {
        /// Microphone name substring (default input device if omitted)
        #[arg(short, long)]
        mic: Option<String>,

        /// Path to the speech model file
        #[arg(short = 'M', long)]
        model: PathBuf,

        /// Source language hint (e.g. es, en)
        #[arg(short, long)]
        language: Option<String>,

        /// Disable the speech-energy gate
        #[arg(long)]
        no_vad: bool,

        /// Settled fragments kept as recognizer context
        #[arg(long, default_value = "3")]
        memory: usize,

        /// Seconds of trailing audio kept provisional
        #[arg(short, long, default_value = "5.0")]
        patience: f64,

        /// Initial context prompt
        #[arg(long, default_value = "")]
        prompt: String,

        /// Serve transcript updates over websocket
        #[arg(long)]
        broadcast: bool,

        /// Websocket bind host
        #[arg(long, default_value = "localhost")]
        ws_host: String,

        /// Websocket bind port
        #[arg(long, default_value = "8765")]
        ws_port: u16,
    },

    /// List available input devices
    Devices,

    /// List known speech model size identifiers
    Models,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet by default, use -v for more.
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    match cli.command {
        Commands::Run {
            mic,
            model,
            language,
            no_vad,
            memory,
            patience,
            prompt,
            broadcast,
            ws_host,
            ws_port,
        } => {
            let config = SessionConfig {
                device: mic,
                model_path: model,
                language,
                vad: !no_vad,
                memory,
                patience_ms: (patience * 1000.0) as u64,
                initial_prompt: prompt,
                broadcast: broadcast.then_some(BroadcastConfig {
                    host: ws_host,
                    port: ws_port,
                }),
            };
            run(config)
        }
        Commands::Devices => list_devices(),
        Commands::Models => {
            for size in KNOWN_MODEL_SIZES {
                println!("{size}");
            }
            Ok(())
        }
    }
}

fn run(config: SessionConfig) -> Result<()> {
    let engine = WhisperEngine::load(&config.model_path, config.language.clone(), config.vad)
        .context("failed to load speech model")?;
    info!(model = engine.model_name(), "model loaded");

    let mut session = Session::start(&config, Arc::new(engine))
        .context("failed to start transcription session")?;
    let results = session
        .take_results()
        .context("result stream already taken")?;

    let flag = session.flag();
    ctrlc::set_handler(move || {
        info!("shutdown requested");
        flag.stop();
    })
    .context("failed to install shutdown handler")?;

    if let Some(endpoint) = &config.broadcast {
        eprintln!("broadcasting on ws://{}:{}/ws", endpoint.host, endpoint.port);
    }
    eprintln!("listening, press ctrl-c to stop");

    // Presentation loop: blocking receive until the terminal marker.
    let mut renderer = Renderer::new();
    loop {
        match results.get() {
            StreamItem::Item(update) => renderer.render(&update)?,
            StreamItem::EndOfStream => break,
        }
    }
    renderer.finish()?;

    session.stop().context("session ended with an error")?;
    Ok(())
}

fn list_devices() -> Result<()> {
    let devices = habla_audio::list_devices().context("failed to enumerate input devices")?;
    if devices.is_empty() {
        println!("No input devices found.");
        return Ok(());
    }
    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        println!("{marker} {}", device.name);
    }
    Ok(())
}
