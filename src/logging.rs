//! Logging setup
//!
//! Console output always; with `--debug` the same events are mirrored to a
//! per-run file under `logs/` next to the executable.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Directory for debug log files
pub fn logs_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("logs")
}

/// File name for this run's log, e.g. `2026-10-19_14-03-12.log`
pub fn log_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("{}.log", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Install the global subscriber
///
/// The returned guard flushes the log file on drop and must be kept alive for
/// the lifetime of the process.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let (file_layer, guard, file_path) = match log_dir.map(open_log_file) {
        Some(Ok((writer, guard, path))) => {
            let layer = tracing_subscriber::fmt::layer()
                .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard), Some(path))
        }
        Some(Err(e)) => {
            eprintln!("Warning: could not create log file: {}", e);
            (None, None, None)
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    if let Some(path) = file_path {
        tracing::info!("Debug logging to: {}", path.display());
    }

    Ok(guard)
}

fn open_log_file(
    dir: &Path,
) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let file_name = log_file_name(chrono::Local::now());
    let path = dir.join(&file_name);
    // Fail here rather than inside the appender, which would only complain on first write
    std::fs::File::create(&path)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok((writer, guard, path))
}
