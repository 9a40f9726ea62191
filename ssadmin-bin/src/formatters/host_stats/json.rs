use anyhow::{Context, Result};
use serde_json::json;

use super::HostStatsFormatter;
use ssadmin_lib::ratelimit::HostStatsMap;

pub(crate) struct Json;

impl Json {
    pub(crate) const fn new() -> Self {
        Self
    }
}

impl HostStatsFormatter for Json {
    /// Format host stats as JSON object
    fn format(&self, host_stats: HostStatsMap) -> Result<Option<String>> {
        let output = json!({
            "host_statistics": host_stats
        });

        serde_json::to_string_pretty(&output)
            .map(Some)
            .context("Cannot format host stats as JSON")
    }
}
