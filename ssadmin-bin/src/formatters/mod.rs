pub(crate) mod color;
pub(crate) mod host_stats;
pub(crate) mod log;
pub(crate) mod response;

use self::{host_stats::HostStatsFormatter, response::ResponseFormatter};
use crate::options::OutputFormat;

/// Create a response formatter based on the given format option
pub(crate) fn get_response_formatter(format: &OutputFormat) -> Box<dyn ResponseFormatter> {
    match format {
        OutputFormat::Compact => Box::new(response::CompactFormatter),
        OutputFormat::Json => Box::new(response::JsonFormatter),
    }
}

pub(crate) fn get_host_stats_formatter(format: &OutputFormat) -> Box<dyn HostStatsFormatter> {
    match format {
        OutputFormat::Compact => Box::new(host_stats::Compact::new()),
        OutputFormat::Json => Box::new(host_stats::Json::new()),
    }
}
