mod compact;
mod json;

pub(crate) use compact::Compact;
pub(crate) use json::Json;

use anyhow::Result;
use ssadmin_lib::ratelimit::HostStatsMap;

/// Trait for formatting per-host statistics in different output formats
pub(crate) trait HostStatsFormatter {
    /// Format the host statistics, `None` if there is nothing to show
    fn format(&self, host_stats: HostStatsMap) -> Result<Option<String>>;
}
