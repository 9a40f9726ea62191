use anyhow::Result;
use std::fmt::{self, Display};

use crate::formatters::color::{DIM, NORMAL, YELLOW, color};
use ssadmin_lib::ratelimit::HostStatsMap;

use super::HostStatsFormatter;

struct CompactHostStats {
    host_stats: HostStatsMap,
}

impl Display for CompactHostStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Per-host Statistics")?;

        let separator = "─".repeat(60);
        color!(f, DIM, "{}", separator)?;
        writeln!(f)?;

        let sorted_hosts = self.host_stats.sorted();

        let hostname_width = sorted_hosts
            .iter()
            .map(|(host, _)| host.len())
            .max()
            .unwrap_or(0)
            .max(10);

        for (host, stats) in sorted_hosts {
            color!(
                f,
                NORMAL,
                "{:<width$} │ {:>6} calls │ {:>6} throttled │ {:>8}ms waited",
                host,
                stats.total_calls,
                stats.throttled_calls,
                stats.total_delay.as_millis(),
                width = hostname_width
            )?;
            if stats.throttled_calls > 0 {
                color!(f, YELLOW, " ({:.1}%)", stats.throttle_rate() * 100.0)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

pub(crate) struct Compact;

impl Compact {
    pub(crate) const fn new() -> Self {
        Self
    }
}

impl HostStatsFormatter for Compact {
    fn format(&self, host_stats: HostStatsMap) -> Result<Option<String>> {
        if host_stats.is_empty() {
            return Ok(None);
        }

        let compact = CompactHostStats { host_stats };
        Ok(Some(compact.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssadmin_lib::ratelimit::HostStats;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_empty_stats_are_not_shown() {
        let formatted = Compact::new().format(HostStatsMap::default()).unwrap();
        assert!(formatted.is_none());
    }

    #[test]
    fn test_busiest_host_first() {
        console::set_colors_enabled(false);
        let host_stats = HostStatsMap::from(HashMap::from([
            (
                "https://ss2:4000".to_string(),
                HostStats {
                    total_calls: 2,
                    ..HostStats::default()
                },
            ),
            (
                "https://ss1:4000".to_string(),
                HostStats {
                    total_calls: 25,
                    throttled_calls: 5,
                    total_delay: Duration::from_secs(5),
                    last_call: None,
                },
            ),
        ]));

        let formatted = Compact::new().format(host_stats).unwrap().unwrap();

        let ss1 = formatted.find("https://ss1:4000").unwrap();
        let ss2 = formatted.find("https://ss2:4000").unwrap();
        assert!(ss1 < ss2);
        assert!(formatted.contains("25 calls"));
        assert!(formatted.contains("5000ms waited (20.0%)"));
    }
}
