use log::{debug, trace};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, sleep};

use super::key::HostKey;
use super::stats::HostStats;
use crate::ratelimit::{CallWindow, RateLimitConfig};

/// How a call was let through by [`Host::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Both windows had room, the call proceeded right away
    Immediate,
    /// A ceiling was reached and the call waited for the given backoff
    Delayed(Duration),
}

impl Admission {
    /// Returns `true` if the call had to wait
    #[must_use]
    pub const fn is_delayed(&self) -> bool {
        matches!(self, Self::Delayed(_))
    }
}

/// The rate state of a single remote host.
///
/// Each host maintains:
/// - The timestamps of its recent calls behind a dedicated async mutex
/// - The limits that apply to it
/// - Statistics about admitted and throttled calls
#[derive(Debug)]
pub struct Host {
    /// The scheme and authority this instance manages
    pub key: HostKey,

    /// Effective limits for this host
    limits: RateLimitConfig,

    /// Call timestamps within the long window.
    /// The lock is held across the backoff sleep, so callers of the same
    /// host are admitted strictly one after another.
    calls: tokio::sync::Mutex<CallWindow>,

    /// Admission statistics
    stats: Mutex<HostStats>,
}

impl Host {
    /// Create a new Host instance for the given key
    #[must_use]
    pub fn new(key: HostKey, limits: RateLimitConfig) -> Self {
        Host {
            key,
            limits,
            calls: tokio::sync::Mutex::new(CallWindow::new()),
            stats: Mutex::new(HostStats::default()),
        }
    }

    /// Wait until a call to this host may proceed and record it.
    ///
    /// This method:
    /// 1. Enters the per-host critical section
    /// 2. Prunes timestamps older than the long window
    /// 3. Counts the calls within the short and the long window
    /// 4. Sleeps once for the backoff if either ceiling is reached
    /// 5. Records the call with the instant taken in step 2
    ///
    /// There is no re-check after the sleep. Under heavy contention a burst
    /// right after the backoff can exceed the ceiling.
    pub async fn acquire(&self) -> Admission {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();

        calls.prune(now, self.limits.long_window);
        let min_calls = calls.len();
        let sec_calls = calls.count_within(now, self.limits.short_window);

        let sec_exceeded = sec_calls >= self.limits.short_ceiling;
        let min_exceeded = min_calls >= self.limits.long_ceiling;

        let admission = if sec_exceeded || min_exceeded {
            debug!(
                "Host {} reached its call ceiling ({sec_calls} calls in {:?}, {min_calls} calls in {:?}), waiting {}ms",
                self.key,
                self.limits.short_window,
                self.limits.long_window,
                self.limits.backoff.as_millis()
            );
            sleep(self.limits.backoff).await;
            Admission::Delayed(self.limits.backoff)
        } else {
            trace!("Host {} admitted call without delay", self.key);
            Admission::Immediate
        };

        calls.record(now);
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(admission, now);

        admission
    }

    /// Snapshot of the stored call timestamps, oldest first
    pub async fn recorded_calls(&self) -> Vec<Instant> {
        self.calls.lock().await.iter().copied().collect()
    }

    /// The limits this host is governed by
    #[must_use]
    pub const fn limits(&self) -> &RateLimitConfig {
        &self.limits
    }

    /// Get host statistics
    pub fn stats(&self) -> HostStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
