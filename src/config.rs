//! Configuration management for MIDI Deduper
//!
//! Settings come from three layers: command-line flags, an optional YAML file
//! and built-in defaults, in that order of precedence. The result is an
//! immutable [`AppConfig`] built once at startup.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::cli::Args;
use crate::deduper::{DeduperConfig, DEFAULT_HISTORY_MAX_SIZE};
use crate::discovery::{default_inputs, default_outputs};
use crate::error::{DeduperError, Result};
use crate::supervisor::SupervisorConfig;

/// One device name or an ordered list of candidates
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NameList {
    One(String),
    Many(Vec<String>),
}

impl NameList {
    fn into_vec(self) -> Vec<String> {
        match self {
            NameList::One(name) => vec![name],
            NameList::Many(names) => names,
        }
    }
}

/// YAML file layout; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<NameList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<NameList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_threshold_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_threshold: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_max_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flam_detection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_delay_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery_backoff_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watchdog_interval_ms: Option<u64>,
}

impl FileConfig {
    /// Load a YAML configuration file
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            DeduperError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
            .map_err(|e| DeduperError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Input device candidates, first match wins
    pub inputs: Vec<String>,
    /// Output device candidates, first match wins
    pub outputs: Vec<String>,
    pub deduper: DeduperConfig,
    pub supervisor: SupervisorConfig,
    pub startup_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            inputs: default_inputs(),
            outputs: default_outputs(),
            deduper: DeduperConfig::default(),
            supervisor: SupervisorConfig::default(),
            startup_delay: Duration::ZERO,
        }
    }
}

impl AppConfig {
    /// Build the configuration from flags plus the optional file they point to
    pub async fn load(args: &Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path).await?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Combine flags, file values and defaults, then validate
    pub fn merge(args: &Args, file: FileConfig) -> Result<Self> {
        let defaults = AppConfig::default();
        let supervisor_defaults = defaults.supervisor.clone();

        let inputs = match (&args.input, file.input) {
            (Some(name), _) => vec![name.clone()],
            (None, Some(list)) => list.into_vec(),
            (None, None) => defaults.inputs,
        };
        let outputs = match (&args.output, file.output) {
            (Some(name), _) => vec![name.clone()],
            (None, Some(list)) => list.into_vec(),
            (None, None) => defaults.outputs,
        };

        let deduper = DeduperConfig {
            time_threshold: args
                .time
                .or(file.time_threshold_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.deduper.time_threshold),
            velocity_threshold: args
                .velocity
                .or(file.velocity_threshold)
                .unwrap_or(defaults.deduper.velocity_threshold),
            history_max_size: file.history_max_size.unwrap_or(DEFAULT_HISTORY_MAX_SIZE),
            flam_detection: args.flam || file.flam_detection.unwrap_or(false),
        };

        let supervisor = SupervisorConfig {
            discovery_backoff: file
                .discovery_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(supervisor_defaults.discovery_backoff),
            restart_delay: file
                .restart_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(supervisor_defaults.restart_delay),
            watchdog_interval: file
                .watchdog_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(supervisor_defaults.watchdog_interval),
        };

        let startup_delay = args
            .wait
            .or(file.startup_delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.startup_delay);

        let config = Self {
            inputs,
            outputs,
            deduper,
            supervisor,
            startup_delay,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.deduper.velocity_threshold > 127 {
            return Err(DeduperError::Config(format!(
                "velocity_threshold must be 0-127, got {}",
                self.deduper.velocity_threshold
            )));
        }
        if self.deduper.history_max_size == 0 {
            return Err(DeduperError::Config(
                "history_max_size must be greater than 0".to_string(),
            ));
        }
        if self.supervisor.watchdog_interval.is_zero() {
            return Err(DeduperError::Config(
                "watchdog_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.inputs.iter().all(|n| n.trim().is_empty()) {
            return Err(DeduperError::Config("no input device name given".to_string()));
        }
        if self.outputs.iter().all(|n| n.trim().is_empty()) {
            return Err(DeduperError::Config("no output device name given".to_string()));
        }
        Ok(())
    }
}
