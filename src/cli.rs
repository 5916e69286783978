//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// MIDI Deduper - filters double-triggered notes from drum pads
#[derive(Parser, Debug, Clone)]
#[command(name = "midi-deduper", author, version, about, long_about = None)]
pub struct Args {
    /// Input MIDI device name (default: auto-detect from list)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output MIDI device name (default: auto-detect from list)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Time threshold in milliseconds for duplicate detection [default: 50]
    #[arg(short, long, value_name = "MS")]
    pub time: Option<u64>,

    /// Velocity threshold (0-127) for duplicate detection [default: 127]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub velocity: Option<u8>,

    /// Allow louder restrikes within the time window (flams, accents)
    #[arg(long)]
    pub flam: bool,

    /// Startup delay in seconds (useful when running as a service)
    #[arg(short, long, value_name = "SECS")]
    pub wait: Option<u64>,

    /// Enable debug logging (also writes to logs/<date>.log next to the executable)
    #[arg(short, long)]
    pub debug: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Optional YAML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// List available MIDI devices and exit
    #[arg(long)]
    pub list: bool,
}

impl Args {
    /// Effective log filter
    pub fn log_filter(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}
