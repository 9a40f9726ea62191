use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

use crate::{formatters, options::OutputMode, verbosity::Verbosity};

/// Width of the `[LEVEL]` prefix, including brackets
const LEVEL_PREFIX_WIDTH: usize = "[ERROR]".len();

/// Initialize the logging system with the given verbosity level.
pub(crate) fn init_logging(verbose: &Verbosity, mode: &OutputMode) {
    // Set a base level for all modules to `warn`, which is a reasonable default.
    // It will be overridden by RUST_LOG if it's set.
    let env = Env::default().filter_or("RUST_LOG", "warn");

    let mut builder = Builder::from_env(env);
    builder
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    if std::env::var("RUST_LOG").is_err() {
        // Other crates (reqwest, hyper) stay at `warn` no matter how many `-v`
        // were given.
        builder.filter_level(LevelFilter::Warn);
        let level_filter = verbose.log_level_filter();
        builder
            .filter_module("ssadmin", level_filter)
            .filter_module("ssadmin_lib", level_filter);
    }

    if mode.is_plain() {
        builder.format(move |buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    } else {
        builder.format(move |buf, record| {
            let level = record.level();
            let prefix = format!("{:>width$}", format!("[{level}]"), width = LEVEL_PREFIX_WIDTH);
            let color = formatters::color::color_for_level(level);
            writeln!(buf, "{} {}", color.apply_to(prefix), record.args())
        });
    }

    builder.init();
}
