//! MIDI Deduper
//!
//! Filters double-triggered notes between a MIDI controller and a DAW.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use midi_deduper::cli::Args;
use midi_deduper::config::AppConfig;
use midi_deduper::discovery;
use midi_deduper::logging::{init_logging, logs_dir};
use midi_deduper::shutdown;
use midi_deduper::supervisor::Supervisor;
use midi_deduper::transport::MidirTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse command line arguments (handles --version and --help)
    let args = Args::parse();

    let transport = Arc::new(MidirTransport::new());

    if args.list {
        discovery::list_devices(transport.as_ref()).context("Failed to enumerate MIDI devices")?;
        return Ok(());
    }

    let config = AppConfig::load(&args)
        .await
        .context("Invalid configuration")?;

    // Keep the guard alive so the log file is flushed on exit
    let log_dir = args.debug.then(logs_dir);
    let _log_guard = init_logging(args.log_filter(), log_dir.as_deref())?;

    info!("MIDI Deduper v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Input candidates: {:?} | output candidates: {:?}",
        config.inputs, config.outputs
    );

    let (trigger, mut shutdown) = shutdown::channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    // Startup delay (e.g., wait for loopMIDI to start)
    if !config.startup_delay.is_zero() {
        info!("Waiting {:?} before starting...", config.startup_delay);
        if shutdown.sleep(config.startup_delay).await {
            info!("Shutdown requested during startup delay");
            return Ok(());
        }
    }

    info!("Press Ctrl+C to exit");
    Supervisor::new(transport, config).run(shutdown).await?;

    info!("MIDI Deduper shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
