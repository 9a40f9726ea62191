//! Per-host call-rate limiting.
//!
//! This module bounds the number of outbound calls to each remote host by
//! two sliding windows, a short one (20 calls per second by default) and a
//! long one (600 calls per minute). A call over either ceiling is delayed
//! once by a flat backoff, never rejected.
//!
//! # Architecture
//!
//! - [`HostKey`]: Scheme and authority of a remote host, e.g. `https://ss3:4000`
//! - [`Host`]: Owns the call timestamps and the lock of one host
//! - [`RateGovernor`]: Registry of hosts, routes [`RateGovernor::acquire`] calls
//! - [`RateLimitConfig`] / [`HostConfig`]: Global limits and per-host overrides
//! - [`HostStats`]: Admission statistics for each host

mod config;
mod governor;
mod host;
mod window;

pub use config::{
    DEFAULT_BACKOFF, DEFAULT_LONG_CEILING, DEFAULT_LONG_WINDOW, DEFAULT_SHORT_CEILING,
    DEFAULT_SHORT_WINDOW, HostConfig, HostConfigs, RateLimitConfig,
};
pub use governor::RateGovernor;
pub use host::{Admission, Host, HostKey, HostStats, HostStatsMap};
pub use window::CallWindow;
