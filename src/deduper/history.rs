//! Bounded history of recently played notes

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::NoteEvent;

/// Insertion-ordered note history with batch eviction
///
/// When full, the oldest tenth of the capacity is dropped in one go before the
/// next append. Timestamps must be appended in non-decreasing order for
/// [`NoteHistory::find_latest`] to be correct.
#[derive(Debug)]
pub struct NoteHistory {
    entries: VecDeque<NoteEvent>,
    max_size: usize,
}

impl NoteHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Most recent entry for `number` no older than `threshold` at `now`
    ///
    /// Scans newest to oldest and gives up at the first same-number entry
    /// that is already too old: anything behind it is older still.
    pub fn find_latest(&self, number: u8, now: Instant, threshold: Duration) -> Option<NoteEvent> {
        for entry in self.entries.iter().rev() {
            if entry.number != number {
                continue;
            }
            if now.saturating_duration_since(entry.timestamp) > threshold {
                return None;
            }
            return Some(*entry);
        }
        None
    }

    /// Append a note, evicting the oldest batch first if at capacity
    pub fn append(&mut self, event: NoteEvent) {
        if self.entries.len() >= self.max_size {
            // At least one entry goes, or tiny capacities would grow forever
            let remove_count = (self.max_size / 10).max(1);
            self.entries.drain(..remove_count.min(self.entries.len()));
        }
        self.entries.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(base: Instant, offset_ms: u64, number: u8, velocity: u8) -> NoteEvent {
        NoteEvent {
            timestamp: base + Duration::from_millis(offset_ms),
            number,
            velocity,
        }
    }

    #[test]
    fn test_find_latest_returns_newest_match() {
        let base = Instant::now();
        let mut history = NoteHistory::new(100);
        history.append(note(base, 0, 60, 100));
        history.append(note(base, 5, 61, 90));
        history.append(note(base, 10, 60, 70));

        let found = history
            .find_latest(60, base + Duration::from_millis(20), Duration::from_millis(50))
            .unwrap();
        assert_eq!(found.velocity, 70);
    }

    #[test]
    fn test_find_latest_respects_threshold() {
        let base = Instant::now();
        let mut history = NoteHistory::new(100);
        history.append(note(base, 0, 60, 100));

        let threshold = Duration::from_millis(50);
        assert!(history.find_latest(60, base + Duration::from_millis(50), threshold).is_some());
        assert!(history.find_latest(60, base + Duration::from_millis(51), threshold).is_none());
        assert!(history.find_latest(61, base, threshold).is_none());
    }

    #[test]
    fn test_find_latest_stops_at_first_stale_match() {
        let base = Instant::now();
        let mut history = NoteHistory::new(100);
        history.append(note(base, 0, 60, 100));
        history.append(note(base, 100, 61, 100));

        // Newest same-number entry is stale, so nothing further back is considered
        let now = base + Duration::from_millis(120);
        assert!(history.find_latest(60, now, Duration::from_millis(50)).is_none());
        assert!(history.find_latest(61, now, Duration::from_millis(50)).is_some());
    }

    #[test]
    fn test_append_evicts_oldest_tenth() {
        let base = Instant::now();
        let mut history = NoteHistory::new(100);
        for i in 0..100u64 {
            history.append(note(base, i, (i % 128) as u8, 100));
        }
        assert_eq!(history.len(), 100);

        history.append(note(base, 100, 1, 100));
        assert_eq!(history.len(), 91);

        // Entries 0..10 are gone; 10 is now the oldest
        assert_eq!(history.entries.front().unwrap().number, 10);
        assert_eq!(history.entries.back().unwrap().number, 1);
    }

    #[test]
    fn test_small_capacity_never_overflows() {
        let base = Instant::now();
        let mut history = NoteHistory::new(3);
        for i in 0..20u64 {
            history.append(note(base, i, 60, 100));
            assert!(history.len() <= history.capacity());
        }
    }
}
