//! Duplicate note detection
//!
//! Decides for every incoming Note-On whether it is a bounce of a note that
//! was just played (and should be dropped) or a legitimate strike.

pub mod history;


use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub use history::NoteHistory;

/// Default time window for duplicate detection
pub const DEFAULT_TIME_THRESHOLD: Duration = Duration::from_millis(50);

/// Default velocity threshold: every note below full velocity can be a duplicate
pub const DEFAULT_VELOCITY_THRESHOLD: u8 = 127;

/// Default number of notes kept in history
pub const DEFAULT_HISTORY_MAX_SIZE: usize = 25_000;

/// A Note-On with non-zero velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub timestamp: Instant,
    pub number: u8,
    pub velocity: u8,
}

/// Deduplication settings, fixed for the lifetime of a [`Deduper`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeduperConfig {
    /// Same-number notes closer than this are duplicate candidates
    pub time_threshold: Duration,
    /// Candidates below this velocity are dropped
    pub velocity_threshold: u8,
    /// Maximum number of notes kept in history
    pub history_max_size: usize,
    /// Let strictly louder restrikes through (flams and accents)
    pub flam_detection: bool,
}

impl Default for DeduperConfig {
    fn default() -> Self {
        Self {
            time_threshold: DEFAULT_TIME_THRESHOLD,
            velocity_threshold: DEFAULT_VELOCITY_THRESHOLD,
            history_max_size: DEFAULT_HISTORY_MAX_SIZE,
            flam_detection: false,
        }
    }
}

/// Running counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_seen: u64,
    pub total_filtered: u64,
    /// Sum of intervals between filtered duplicates and the note they repeated
    pub filtered_interval_total: Duration,
}

impl Stats {
    /// Percentage of seen notes that were filtered
    pub fn filter_ratio(&self) -> f64 {
        if self.total_seen == 0 {
            return 0.0;
        }
        self.total_filtered as f64 / self.total_seen as f64 * 100.0
    }

    /// Mean interval of filtered duplicates
    pub fn average_filtered_interval(&self) -> Option<Duration> {
        if self.total_filtered == 0 {
            return None;
        }
        let nanos = self.filtered_interval_total.as_nanos() / self.total_filtered as u128;
        Some(Duration::from_nanos(nanos as u64))
    }
}

/// History and counters are updated together under one lock
#[derive(Debug)]
struct DeduperState {
    history: NoteHistory,
    stats: Stats,
}

/// Thread-safe duplicate note filter
#[derive(Debug)]
pub struct Deduper {
    config: DeduperConfig,
    state: Mutex<DeduperState>,
}

impl Deduper {
    pub fn new(config: DeduperConfig) -> Self {
        let history = NoteHistory::new(config.history_max_size);
        Self {
            config,
            state: Mutex::new(DeduperState {
                history,
                stats: Stats::default(),
            }),
        }
    }

    pub fn config(&self) -> &DeduperConfig {
        &self.config
    }

    /// Returns true if `note` is a duplicate and must not be forwarded
    pub fn should_filter(&self, note: NoteEvent) -> bool {
        let mut state = self.state.lock();
        let state = &mut *state;

        state.stats.total_seen += 1;

        let last = state
            .history
            .find_latest(note.number, note.timestamp, self.config.time_threshold);

        let Some(last) = last else {
            state.history.append(note);
            return false;
        };

        let interval = note.timestamp.saturating_duration_since(last.timestamp);

        if self.config.flam_detection && note.velocity > last.velocity {
            debug!(
                "Flam/accent allowed: note {} | velocity {} > {} | interval {:?}",
                note.number, note.velocity, last.velocity, interval
            );
            // Later bounces are measured against the louder strike
            state.history.append(note);
            return false;
        }

        if note.velocity < self.config.velocity_threshold {
            state.stats.total_filtered += 1;
            state.stats.filtered_interval_total += interval;
            warn!(
                "Duplicate note filtered: note {} | velocity {} | interval {:?} | stats {}/{} ({:.2}%)",
                note.number,
                note.velocity,
                interval,
                state.stats.total_filtered,
                state.stats.total_seen,
                state.stats.filter_ratio()
            );
            return true;
        }

        state.history.append(note);
        false
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> Stats {
        self.state.lock().stats
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }
}
