use dashmap::DashMap;
use std::sync::Arc;

use crate::ratelimit::{
    Admission, Host, HostConfig, HostConfigs, HostKey, HostStats, HostStatsMap, RateLimitConfig,
};

/// Throttles outbound calls per remote host.
///
/// The `RateGovernor` is the registry of [`Host`] states. It creates a
/// state on-demand the first time a host is seen and routes every
/// [`RateGovernor::acquire`] call to it.
///
/// # Architecture
///
/// - Each unique scheme+authority gets its own [`Host`] with its own lock
/// - Hosts are created lazily and live as long as the governor
/// - The registry is a `DashMap`, so its shard lock is only held while a
///   host is looked up or inserted, never while calls are counted
/// - Calls to different hosts never wait for each other
///
/// The governor is an ordinary value. Share it between clients by wrapping
/// it in an [`Arc`].
#[derive(Debug, Default)]
pub struct RateGovernor {
    /// Map of host key to host state, created on-demand
    hosts: DashMap<HostKey, Arc<Host>>,

    /// Global configuration for rate limiting defaults
    global_config: RateLimitConfig,

    /// Per-host configuration overrides
    host_configs: HostConfigs,
}

impl RateGovernor {
    /// Create a new `RateGovernor` with the given configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use ssadmin_lib::ratelimit::{RateGovernor, RateLimitConfig};
    /// use std::collections::HashMap;
    ///
    /// let governor = RateGovernor::new(RateLimitConfig::default(), HashMap::new());
    /// assert_eq!(governor.active_host_count(), 0);
    /// ```
    #[must_use]
    pub fn new(global_config: RateLimitConfig, host_configs: HostConfigs) -> Self {
        Self {
            hosts: DashMap::new(),
            global_config,
            host_configs,
        }
    }

    /// Wait until a call to `host` may proceed and record it.
    ///
    /// Never fails and never rejects a call. If the host reached one of
    /// its ceilings the caller is delayed once by the configured backoff.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ssadmin_lib::ratelimit::{Admission, HostKey, RateGovernor};
    /// # #[tokio::main]
    /// # async fn main() {
    /// let governor = RateGovernor::default();
    /// let admission = governor.acquire(&HostKey::from("https://ss3:4000")).await;
    /// assert_eq!(admission, Admission::Immediate);
    /// # }
    /// ```
    pub async fn acquire(&self, host: &HostKey) -> Admission {
        // The registry guard is dropped here, before the host lock is taken
        let host = self.get_or_create_host(host);
        host.acquire().await
    }

    /// Get an existing host or create a new one for the given key
    pub fn get_or_create_host(&self, host_key: &HostKey) -> Arc<Host> {
        // Check if host already exists
        if let Some(host) = self.hosts.get(host_key) {
            return host.clone();
        }

        // The entry API holds the shard lock, so a host racing us for the
        // same key either sees our insert or we see theirs
        self.hosts
            .entry(host_key.clone())
            .or_insert_with(|| {
                let limits = self
                    .host_configs
                    .get(host_key)
                    .copied()
                    .unwrap_or_default()
                    .effective(&self.global_config);
                log::debug!("Tracking call rate for new host {host_key}");
                Arc::new(Host::new(host_key.clone(), limits))
            })
            .clone()
    }

    /// Number of timestamps currently stored for `host`, 0 for unknown hosts
    pub async fn recorded_calls(&self, host: &HostKey) -> usize {
        let Some(host) = self.hosts.get(host).map(|h| h.clone()) else {
            return 0;
        };
        host.recorded_calls().await.len()
    }

    /// Get statistics for a specific host
    ///
    /// Returns empty stats if the host has not been contacted yet.
    #[must_use]
    pub fn host_stats(&self, host: &HostKey) -> HostStats {
        self.hosts
            .get(host)
            .map(|host| host.stats())
            .unwrap_or_default()
    }

    /// Get statistics for all hosts that have been contacted
    #[must_use]
    pub fn all_host_stats(&self) -> HostStatsMap {
        self.hosts
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().stats()))
            .collect::<std::collections::HashMap<_, _>>()
            .into()
    }

    /// Get the number of hosts with a rate state
    #[must_use]
    pub fn active_host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Global configuration defaults
    #[must_use]
    pub const fn global_config(&self) -> &RateLimitConfig {
        &self.global_config
    }

    /// The configuration override for a host, if any
    #[must_use]
    pub fn host_config(&self, host: &HostKey) -> Option<&HostConfig> {
        self.host_configs.get(host)
    }
}
