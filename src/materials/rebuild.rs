//! Debounce for index rebuilds.

use std::time::{Duration, Instant};

/// Tracks whether the material indices are stale and when they may be
/// rebuilt.
///
/// Every change restarts the quiet period, so a burst of N changes leads to a
/// single rebuild once the burst is over. Time is passed in by the caller.
#[derive(Debug, Clone)]
pub struct RebuildTracker {
    debounce: Duration,

    /// Whether a change arrived since the last rebuild.
    dirty: bool,

    /// When the most recent change arrived.
    last_change: Option<Instant>,

    /// Changes coalesced into the pending rebuild.
    pending_changes: usize,

    rebuilds: usize,
}

impl RebuildTracker {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            dirty: false,
            last_change: None,
            pending_changes: 0,
            rebuilds: 0,
        }
    }

    pub fn from_millis(debounce_ms: u64) -> Self {
        Self::new(Duration::from_millis(debounce_ms))
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record a change at `now` and restart the quiet period.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty = true;
        self.last_change = Some(now);
        self.pending_changes += 1;
    }

    /// True once the quiet period has passed since the last change.
    pub fn is_due(&self, now: Instant) -> bool {
        match (self.dirty, self.last_change) {
            (true, Some(last)) => now.saturating_duration_since(last) >= self.debounce,
            _ => false,
        }
    }

    /// Record that a rebuild ran. Returns how many changes it covered.
    pub fn complete(&mut self) -> usize {
        let covered = self.pending_changes;
        self.dirty = false;
        self.last_change = None;
        self.pending_changes = 0;
        self.rebuilds += 1;
        covered
    }

    /// Number of rebuilds since creation.
    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }
}
