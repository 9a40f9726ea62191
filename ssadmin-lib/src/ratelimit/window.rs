use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// The recent call timestamps of one host, oldest first.
///
/// Timestamps are only ever appended, so the deque stays sorted and
/// pruning pops from the front.
#[derive(Debug, Clone, Default)]
pub struct CallWindow {
    calls: VecDeque<Instant>,
}

impl CallWindow {
    /// Create an empty window
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every timestamp that is `window` or more in the past
    pub fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.calls.front() {
            if now.saturating_duration_since(oldest) < window {
                break;
            }
            self.calls.pop_front();
        }
    }

    /// Number of timestamps less than `window` in the past
    #[must_use]
    pub fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.calls
            .iter()
            .rev()
            .take_while(|&&call| now.saturating_duration_since(call) < window)
            .count()
    }

    /// Record a call
    pub fn record(&mut self, at: Instant) {
        self.calls.push_back(at);
    }

    /// Get the number of timestamps currently stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check if the window is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Get an iterator over the stored timestamps, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Instant> {
        self.calls.iter()
    }
}
