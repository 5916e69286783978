//! Connection supervisor
//!
//! Outer retry loop: discover devices, run a session, and go back to
//! discovery whenever the session ends with an error. Retries never give up;
//! the controller may stay unplugged for as long as it likes.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::deduper::{Deduper, Stats};
use crate::discovery;
use crate::error::Result;
use crate::session::{DeviceSession, DEFAULT_WATCHDOG_INTERVAL};
use crate::shutdown::Shutdown;
use crate::transport::MidiTransport;

/// Default wait before retrying discovery when a device is missing
pub const DEFAULT_DISCOVERY_BACKOFF: Duration = Duration::from_secs(5);

/// Default wait before rediscovering after a session failed
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(1);

/// Supervisor timings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub discovery_backoff: Duration,
    pub restart_delay: Duration,
    pub watchdog_interval: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            discovery_backoff: DEFAULT_DISCOVERY_BACKOFF,
            restart_delay: DEFAULT_RESTART_DELAY,
            watchdog_interval: DEFAULT_WATCHDOG_INTERVAL,
        }
    }
}

pub struct Supervisor {
    transport: Arc<dyn MidiTransport>,
    config: AppConfig,
}

impl Supervisor {
    pub fn new(transport: Arc<dyn MidiTransport>, config: AppConfig) -> Self {
        Self { transport, config }
    }

    /// Run until shutdown is requested
    pub async fn run(&self, mut shutdown: Shutdown) -> Result<()> {
        let timings = &self.config.supervisor;

        loop {
            if shutdown.is_triggered() {
                return Ok(());
            }

            let (input, output) = match discovery::resolve_devices(
                self.transport.as_ref(),
                &self.config.inputs,
                &self.config.outputs,
            ) {
                Ok(devices) => devices,
                Err(e) => {
                    warn!(
                        "{}; retrying in {:?}",
                        e, timings.discovery_backoff
                    );
                    if shutdown.sleep(timings.discovery_backoff).await {
                        return Ok(());
                    }
                    continue;
                }
            };

            let deduper = Arc::new(Deduper::new(self.config.deduper.clone()));
            let mut session = DeviceSession::new(
                Arc::clone(&self.transport),
                input,
                output,
                Arc::clone(&deduper),
                timings.watchdog_interval,
            );

            info!(
                "MIDI Deduper running (time threshold {:?}, velocity threshold {}, flam detection {})",
                self.config.deduper.time_threshold,
                self.config.deduper.velocity_threshold,
                if self.config.deduper.flam_detection { "on" } else { "off" },
            );

            match session.run(&mut shutdown).await {
                Ok(()) => {
                    log_summary(&deduper.stats());
                    return Ok(());
                }
                Err(e) => {
                    warn!("Session ended: {}; restarting discovery", e);
                    log_summary(&deduper.stats());
                    if shutdown.sleep(timings.restart_delay).await {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn log_summary(stats: &Stats) {
    let average = stats
        .average_filtered_interval()
        .map(|d| format!("{:?}", d))
        .unwrap_or_else(|| "-".to_string());
    info!(
        "Session statistics: notes {} | duplicates {} ({:.2}%) | avg. interval {}",
        stats.total_seen,
        stats.total_filtered,
        stats.filter_ratio(),
        average
    );
}
