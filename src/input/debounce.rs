//! Time-based debouncer shared by matrix cells and the encoder button

use std::time::{Duration, Instant};

/// Debounce state for one electrical input
///
/// A change is accepted only once the new level has been sampled
/// continuously for at least the configured window.
#[derive(Debug, Clone, Copy, Default)]
pub struct Debouncer {
    stable: bool,
    candidate_since: Option<Instant>,
}

impl Debouncer {
    /// Feed one sample; returns the new stable level when it changes
    pub fn sample(&mut self, level: bool, now: Instant, window: Duration) -> Option<bool> {
        if level == self.stable {
            self.candidate_since = None;
            return None;
        }

        let since = *self.candidate_since.get_or_insert(now);
        if now.saturating_duration_since(since) >= window {
            self.stable = level;
            self.candidate_since = None;
            Some(level)
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.stable
    }
}
