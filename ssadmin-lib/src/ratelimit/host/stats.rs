use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::ratelimit::Admission;

/// A [`HashMap`] mapping hosts to their [`HostStats`]
#[derive(Debug, Default, Serialize)]
pub struct HostStatsMap(HashMap<String, HostStats>);

impl HostStatsMap {
    /// Sort host statistics by call count (descending order)
    /// This matches the display order we want in the output
    #[must_use]
    pub fn sorted(&self) -> Vec<(String, HostStats)> {
        let mut sorted_hosts: Vec<_> = self.0.clone().into_iter().collect();
        sorted_hosts.sort_by(|(a_host, a), (b_host, b)| {
            b.total_calls
                .cmp(&a.total_calls)
                .then_with(|| a_host.cmp(b_host))
        });
        sorted_hosts
    }

    /// Check if no host has been contacted yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, HostStats>> for HostStatsMap {
    fn from(value: HashMap<String, HostStats>) -> Self {
        Self(value)
    }
}

/// Record and report throttling statistics for a [`crate::ratelimit::Host`]
#[derive(Debug, Clone, Default)]
pub struct HostStats {
    /// Total number of admitted calls
    pub total_calls: u64,
    /// Number of calls that were delayed before admission
    pub throttled_calls: u64,
    /// Sum of all delays applied to this host
    pub total_delay: Duration,
    /// Time of the last admitted call
    pub last_call: Option<Instant>,
}

impl HostStats {
    /// Record one admission
    pub fn record(&mut self, admission: Admission, at: Instant) {
        self.total_calls += 1;
        self.last_call = Some(at);
        if let Admission::Delayed(delay) = admission {
            self.throttled_calls += 1;
            self.total_delay += delay;
        }
    }

    /// Share of calls which had to wait, between 0.0 and 1.0
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throttle_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.throttled_calls as f64 / self.total_calls as f64
        }
    }
}

impl Serialize for HostStats {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut stats = s.serialize_struct("HostStats", 5)?;
        stats.serialize_field("total_calls", &self.total_calls)?;
        stats.serialize_field("throttled_calls", &self.throttled_calls)?;
        stats.serialize_field("throttle_rate", &self.throttle_rate())?;
        #[allow(clippy::cast_possible_truncation)]
        stats.serialize_field("total_delay_ms", &(self.total_delay.as_millis() as u64))?;
        #[allow(clippy::cast_possible_truncation)]
        let last_call_ms_ago = self.last_call.map(|at| at.elapsed().as_millis() as u64);
        stats.serialize_field("last_call_ms_ago", &last_call_ms_ago)?;
        stats.end()
    }
}
