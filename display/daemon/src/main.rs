//! Display Daemon - Headless Display Engine over JSON Lines
//!
//! Runs one display engine and bridges it to a host process: commands and
//! surface signals come in on stdin, surface ops, notifications and replies go
//! out on stdout, one JSON object per line. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! display-daemon
//!
//! # With config file
//! display-daemon --config /etc/display-engine/display.toml
//!
//! # Smaller output, faster handover cleanup
//! display-daemon --width 1280 --height 720 --settle-delay-ms 1000
//!
//! # Verbose logging
//! RUST_LOG=debug display-daemon
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Graceful shutdown
//! - stdin EOF: Graceful shutdown

mod bridge;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use display_core::config::{default_config_path, load_config_from_path, ConfigOverrides};
use display_core::{notifications, runtime, CommandDispatcher, Engine};

use bridge::JsonLineSurface;

/// Display Daemon - headless presentation display engine
#[derive(Parser, Debug)]
#[command(name = "display-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "DISPLAY_ENGINE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "DISPLAY_ENGINE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Delay before a superseded item is discarded (milliseconds)
    #[arg(long, value_name = "MS")]
    settle_delay_ms: Option<u64>,

    /// Redraw frame interval (milliseconds)
    #[arg(long, value_name = "MS")]
    frame_interval_ms: Option<u64>,

    /// Output width in pixels
    #[arg(long, requires = "height", value_name = "PX")]
    width: Option<u32>,

    /// Output height in pixels
    #[arg(long, requires = "width", value_name = "PX")]
    height: Option<u32>,

    /// Media types the renderer can decode (comma separated)
    #[arg(long, env = "DISPLAY_ENGINE_MEDIA_TYPES", value_delimiter = ',', value_name = "MIME")]
    media_types: Vec<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ms) = self.settle_delay_ms {
            overrides = overrides.with_settle_delay_ms(ms);
        }
        if let Some(ms) = self.frame_interval_ms {
            overrides = overrides.with_frame_interval_ms(ms);
        }
        if let (Some(width), Some(height)) = (self.width, self.height) {
            overrides = overrides.with_size(width, height);
        }
        overrides
    }
}

/// Initialize logging with the specified level
///
/// stdout carries the protocol, so logs are written to stderr.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("display_daemon={level},display_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging first
    init_logging(&args.log_level);

    info!("Display daemon starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config
        .validate()
        .context("Invalid configuration after CLI overrides")?;
    info!(
        source = %config.source(),
        width = config.engine.canvas.width,
        height = config.engine.canvas.height,
        settle_delay = ?config.engine.settle_delay,
        "Configuration loaded"
    );

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    // Output side: everything funnels into one writer
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(bridge::write_outputs(tokio::io::stdout(), out_rx));

    // Engine
    let (notifier, notification_rx) = notifications::channel(config.notification_capacity);
    let surface = JsonLineSurface::new(out_tx.clone(), args.media_types.clone());
    let engine = Engine::new(config.engine.clone(), surface, notifier);
    tokio::spawn(bridge::forward_notifications(notification_rx, out_tx.clone()));

    // Input side
    let (input_tx, input_rx) = mpsc::channel(config.command_capacity);
    let reader_out = out_tx.clone();
    let reader = tokio::spawn(async move {
        bridge::read_inputs(BufReader::new(tokio::io::stdin()), input_tx, &reader_out).await
    });

    let reply_out = out_tx.clone();
    let mut engine_task = Box::pin(runtime::run(
        CommandDispatcher::new(engine),
        input_rx,
        move |dispatched| bridge::publish_reply(dispatched, &reply_out),
    ));

    tokio::select! {
        dispatcher = &mut engine_task => {
            info!(
                initialized = dispatcher.engine().is_initialized(),
                "Input closed, shutting down"
            );
        }
        _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
        _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
    }

    // Cleanup: the engine holds output senders, so it goes before the writer drains
    drop(engine_task);
    reader.abort();
    match reader.await {
        Ok(Ok(forwarded)) => info!(forwarded, "Input reader finished"),
        Ok(Err(e)) => warn!(error = %e, "Input reader failed"),
        Err(_) => {}
    }
    drop(out_tx);

    match writer.await {
        Ok(Ok(())) => {
            info!("Display daemon stopped cleanly");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(error = %e, "Output writer failed");
            Err(e.into())
        }
        Err(e) => {
            error!(error = %e, "Output writer panicked");
            Err(e.into())
        }
    }
}
