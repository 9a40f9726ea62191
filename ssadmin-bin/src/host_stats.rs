use anyhow::Result;
use ssadmin_lib::ratelimit::RateGovernor;

use crate::{formatters::get_host_stats_formatter, options::Config};

/// Display per-host statistics if requested
pub(crate) fn display_per_host_statistics(governor: &RateGovernor, config: &Config) -> Result<()> {
    if !config.host_stats {
        return Ok(());
    }

    let host_stats_formatter = get_host_stats_formatter(&config.format);
    if let Some(formatted_host_stats) = host_stats_formatter.format(governor.all_host_stats())? {
        println!("{formatted_host_stats}");
    }
    Ok(())
}
