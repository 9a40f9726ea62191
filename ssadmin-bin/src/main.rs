//! `ssadmin` sends calls to the administration API of an X-Road security
//! server.
//!
//! The binary is a wrapper around ssadmin-lib, which keeps every host below
//! its call ceilings and reports failed calls with their origin.
//!
//! List the clients of a security server:
//! ```sh
//! ssadmin --security-server https://ss3:4000 GET /clients
//! ```
//!
//! Fill placeholders and add query parameters:
//! ```sh
//! ssadmin -s https://ss3:4000 GET /clients/{id} --path-param id=DEV:COM:1234
//! ssadmin -s https://ss3:4000 GET /clients --query-param show_members=false
//! ```
//!
//! Send a body and repeat the call, rate limited per host:
//! ```sh
//! ssadmin -s https://ss3:4000 POST /clients/{id}/local-groups \
//!     --path-param id=DEV:COM:1234 --body '{"code": "group1"}' --repeat 50 --host-stats
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

use std::io::{self, ErrorKind};
use std::path::PathBuf;

use anyhow::{Error, Result, bail};
use clap::{Parser, crate_version};
use formatters::log::init_logging;
use log::error;

#[cfg(feature = "native-tls")]
use openssl_sys as _; // required for vendored-openssl feature

use options::SSADMIN_CONFIG_FILE;
use ring as _; // required for apple silicon
use ssadmin_lib::diagnostics::CallStack;
use ssadmin_lib::frame;

mod api;
mod client;
mod controllers;
mod formatters;
mod host_stats;
mod options;
mod parse;
mod verbosity;

use crate::{
    controllers::ControllerParams,
    formatters::get_response_formatter,
    host_stats::display_per_host_statistics,
    options::{Config, SsadminOptions},
};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator.
    #[allow(unused)]
    UnexpectedFailure = 1,
    ApiFailure = 2,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Merge all provided config options into one.
/// This includes a potential config file, command-line- and environment variables
///
/// `opts` is left untouched when the config file can't be loaded.
fn load_config(opts: &mut SsadminOptions) -> Result<()> {
    // Load a potentially existing config file and merge it into the config from
    // the CLI
    if let Some(config_file) = &opts.config_file {
        match Config::load_from_file(config_file) {
            Ok(c) => opts.config.merge(c),
            Err(e) => {
                bail!(
                    "Cannot load configuration file `{}`: {e:?}",
                    config_file.display()
                );
            }
        }
    } else {
        // If no config file was explicitly provided, we try to load the default
        // config file from the current directory if the file exits. This will
        // raise an error if the file is invalid, just like the explicit provided
        // config file.
        let default_config = PathBuf::from(SSADMIN_CONFIG_FILE);
        if default_config.is_file() {
            match Config::load_from_file(&default_config) {
                Ok(c) => opts.config.merge(c),
                Err(e) => {
                    bail!(
                        "Cannot load default configuration file `{}`: {e:?}",
                        default_config.display()
                    );
                }
            }
        }
    }

    if opts.config.security_server.is_none() {
        bail!("No security server given, use `--security-server` or `security_server` in the config file");
    }

    Ok(())
}

/// Set up runtime and call the ssadmin entrypoint
fn run_main() -> Result<i32> {
    use std::process::exit;

    let mut opts = SsadminOptions::parse();

    // Logging is set up once, after the config file is merged
    let loaded = load_config(&mut opts);
    init_logging(&opts.config.verbose, &opts.config.mode);

    if let Err(e) = loaded {
        error!(
            "Error while loading config: {e}\n\
            See: ssadmin.example.toml shipped with ssadmin v{}",
            crate_version!()
        );
        exit(ExitCode::ConfigFile as i32);
    }

    if opts.config.mode.is_plain() {
        console::set_colors_enabled(false);
    }

    let runtime = match opts.config.threads {
        Some(threads) => {
            // We define our own runtime instead of the `tokio::main` attribute
            // since we want to make the number of threads configurable
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(threads)
                .enable_all()
                .build()?
        }
        None => tokio::runtime::Runtime::new()?,
    };

    match runtime.block_on(run(&opts)) {
        Err(e) if Some(ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            exit(ExitCode::Success as i32);
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
/// This is helpful for troubleshooting the root cause of an error.
/// Code is taken from the anyhow documentation.
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
    }
    None
}

/// Run ssadmin with the given options
async fn run(opts: &SsadminOptions) -> Result<i32> {
    let governor = client::create_governor(&opts.config);
    let params = ControllerParams {
        client: client::create(&opts.config, governor.clone())?,
        formatter: get_response_formatter(&opts.config.format),
        cfg: opts.config.clone(),
    };

    let stack = CallStack::new().enter(frame!("run"));
    let exit_code =
        controllers::request(&params, opts.call_descriptor(), opts.body.clone(), &stack).await?;

    display_per_host_statistics(&governor, &opts.config)?;

    Ok(exit_code as i32)
}
