use crate::parse::{parse_json_body, parse_key_value, parse_method};
use crate::verbosity::Verbosity;
use anyhow::{Context, Error, Result, anyhow};
use clap::builder::PossibleValuesParser;
use clap::{Parser, builder::TypedValueParser};
use const_format::{concatcp, formatcp};
use http::{
    HeaderMap, Method,
    header::{HeaderName, HeaderValue},
};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use ssadmin_lib::diagnostics::CallDescriptor;
use ssadmin_lib::ratelimit::{HostConfigs, RateLimitConfig};
use ssadmin_lib::{DEFAULT_API_BASE_PATH, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use std::collections::HashMap;
use std::path::Path;
use std::{fs, path::PathBuf, str::FromStr, time::Duration};
use strum::{Display, EnumString, VariantNames};
use url::Url;

pub(crate) const SSADMIN_CONFIG_FILE: &str = "ssadmin.toml";

const DEFAULT_REPEAT: usize = 1;
const DEFAULT_CONCURRENCY: usize = 8;

// this exists because clap requires `&str` type values for defaults
// whereas serde expects owned `String` types
// (we can't use e.g. `TIMEOUT` or `timeout()` which gets created for serde)
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS);
const REPEAT_STR: &str = concatcp!(DEFAULT_REPEAT);
const CONCURRENCY_STR: &str = concatcp!(DEFAULT_CONCURRENCY);
// We use a custom help message here because we want to show the default
// value of the config file, but also be able to check if the user has
// provided a custom value. If they didn't, we won't throw an error if
// the file doesn't exist.
const HELP_MSG_CONFIG_FILE: &str = formatcp!(
    "Configuration file to use\n\n[default: {}]",
    SSADMIN_CONFIG_FILE,
);

/// The format used for responses, failures and host statistics
#[derive(Debug, Deserialize, Default, Clone, Display, VariantNames, PartialEq, Eq)]
#[non_exhaustive]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub(crate) enum OutputFormat {
    /// Response bodies as sent by the server, human readable statistics
    #[default]
    Compact,
    /// Everything as JSON documents
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_lowercase().as_str() {
            "compact" | "string" => Ok(OutputFormat::Compact),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format {format}")),
        }
    }
}

/// The different formatter modes
///
/// This decides over whether to use color for the output.
#[derive(
    Debug, Deserialize, Default, Clone, Display, EnumString, VariantNames, PartialEq, Eq,
)]
#[non_exhaustive]
pub(crate) enum OutputMode {
    /// Plain text output.
    ///
    /// Useful for scripting or when you want to pipe the output to another
    /// program.
    #[serde(rename = "plain")]
    #[strum(serialize = "plain", ascii_case_insensitive)]
    Plain,

    /// Colorful output.
    ///
    /// This is the default output mode.
    #[serde(rename = "color")]
    #[strum(serialize = "color", ascii_case_insensitive)]
    #[default]
    Color,
}

impl OutputMode {
    /// Returns `true` if the response format is `Plain`
    pub(crate) const fn is_plain(&self) -> bool {
        matches!(self, OutputMode::Plain)
    }
}

// Macro for generating default functions to be used by serde
macro_rules! default_function {
    ( $( $name:ident : $T:ty = $e:expr; )* ) => {
        $(
            #[allow(clippy::missing_const_for_fn)]
            fn $name() -> $T {
                $e
            }
        )*
    };
}

// Generate the functions for serde defaults
default_function! {
    api_base_path: String = DEFAULT_API_BASE_PATH.to_string();
    user_agent: String = DEFAULT_USER_AGENT.to_string();
    timeout: usize = DEFAULT_TIMEOUT_SECS;
    repeat: usize = DEFAULT_REPEAT;
    concurrency: usize = DEFAULT_CONCURRENCY;
    verbosity: Verbosity = Verbosity::default();
}

// Macro for merging configuration values
macro_rules! fold_in {
    ($cli:ident , $toml:ident ; $ty:ident { $(..$ignore:ident,)* $( $key:ident : $default:expr, )* } ) => {
        if (false) {
            #[allow(dead_code, unused, clippy::diverging_sub_expression)]
            let _check_fold_in_exhaustivity = $ty {
                $($key: unreachable!(), )*
                $($ignore: unreachable!(), )*
            };
        };
        $(
            if $cli.$key == $default && $toml.$key != $default {
                $cli.$key = $toml.$key;
            }
        )*
    };
}

/// Parse a single header into a [`HeaderName`] and [`HeaderValue`]
///
/// Headers are expected to be in format `Header-Name: Header-Value`.
/// The header name and value are trimmed of whitespace.
///
/// If the header contains multiple colons, the part after the first colon is
/// considered the value.
///
/// # Errors
///
/// This fails if the header does not contain a `:` character or
/// if the header name contains non-ASCII characters.
fn parse_single_header(header: &str) -> Result<(HeaderName, HeaderValue)> {
    match header.split_once(':') {
        Some((name, value)) => {
            let name = name.trim();
            let name = HeaderName::from_str(name)
                .map_err(|e| anyhow!("Unable to convert header name '{name}': {e}"))?;
            let value = HeaderValue::from_str(value.trim())
                .map_err(|e| anyhow!("Unable to read value of header with name '{name}': {e}"))?;
            Ok((name, value))
        }
        None => Err(anyhow!(
            "Invalid header format. Expected colon-separated string in the format 'HeaderName: HeaderValue'"
        )),
    }
}

/// Parses a single HTTP header into a tuple of (String, String)
///
/// This does NOT merge multiple headers into one.
#[derive(Clone, Debug)]
struct HeaderParser;

impl TypedValueParser for HeaderParser {
    type Value = (String, String);

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let invalid_utf8 = || {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                "Header value contains invalid UTF-8",
            )
        };
        let header_str = value.to_str().ok_or_else(invalid_utf8)?;

        match parse_single_header(header_str) {
            Ok((name, value)) => {
                let value = value.to_str().map_err(|_| invalid_utf8())?;
                Ok((name.to_string(), value.to_string()))
            }
            Err(e) => Err(clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                e.to_string(),
            )),
        }
    }
}

impl clap::builder::ValueParserFactory for HeaderParser {
    type Parser = HeaderParser;
    fn value_parser() -> Self::Parser {
        HeaderParser
    }
}

/// Extension trait for converting a Vec of header pairs to a `HeaderMap`
pub(crate) trait HeaderMapExt {
    /// Convert a collection of header key-value pairs to a `HeaderMap`
    fn from_header_pairs(headers: &[(String, String)]) -> Result<HeaderMap, Error>;
}

impl HeaderMapExt for HeaderMap {
    fn from_header_pairs(headers: &[(String, String)]) -> Result<HeaderMap, Error> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("Invalid header name '{name}': {e}"))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| anyhow!("Invalid header value of '{name}': {e}"))?;
            header_map.insert(header_name, header_value);
        }
        Ok(header_map)
    }
}

/// ssadmin sends calls to the administration API of a security server.
///
/// Every call is rate limited per host. Failed calls are reported as JSON
/// together with the request and the controller that issued it.
#[derive(Parser, Debug)]
#[command(version, about, next_display_order = None)]
pub(crate) struct SsadminOptions {
    /// HTTP method of the call, e.g. `GET` or `PATCH`
    #[arg(value_parser = parse_method)]
    pub(crate) method: Method,

    /// Resource path below the API base path.
    #[arg(long_help = "Resource path below the API base path, e.g. `/clients` or
`/clients/{id}/local-groups`. Placeholders in braces are filled with the values
given by `--path-param`.")]
    pub(crate) resource_path: String,

    /// Value for a `{name}` placeholder of the resource path, as `name=value`
    #[arg(
        short = 'p',
        long,
        action = clap::ArgAction::Append,
        value_parser = parse_key_value,
        value_name = "NAME=VALUE"
    )]
    pub(crate) path_param: Vec<(String, String)>,

    /// Query string parameter, as `name=value`
    #[arg(
        short = 'Q',
        long,
        action = clap::ArgAction::Append,
        value_parser = parse_key_value,
        value_name = "NAME=VALUE"
    )]
    pub(crate) query_param: Vec<(String, String)>,

    /// Header sent with this call only, as `Name: Value`
    #[arg(
        long,
        action = clap::ArgAction::Append,
        value_parser = HeaderParser,
        value_name = "HEADER:VALUE"
    )]
    pub(crate) request_header: Vec<(String, String)>,

    /// JSON request body
    #[arg(short, long, value_parser = parse_json_body)]
    pub(crate) body: Option<serde_json::Value>,

    /// Configuration file to use
    #[arg(short, long = "config")]
    #[arg(help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) config: Config,
}

impl SsadminOptions {
    /// The call described by the command-line arguments
    pub(crate) fn call_descriptor(&self) -> CallDescriptor {
        let call = CallDescriptor::new(self.method.clone(), self.resource_path.clone());
        let call = self
            .path_param
            .iter()
            .fold(call, |call, (k, v)| call.path_param(k, v));
        let call = self
            .query_param
            .iter()
            .fold(call, |call, (k, v)| call.query_param(k, v));
        self.request_header
            .iter()
            .fold(call, |call, (k, v)| call.header_param(k, v))
    }
}

// Custom deserializer function for the header field
fn deserialize_headers<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = HashMap::<String, String>::deserialize(deserializer)?;
    Ok(map.into_iter().collect())
}

/// The main configuration for ssadmin
#[allow(clippy::struct_excessive_bools)]
#[derive(Parser, Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Base URL of the security server, e.g. `https://ss3:4000`
    #[arg(short, long, env = "SSADMIN_SECURITY_SERVER")]
    #[serde(default)]
    pub(crate) security_server: Option<Url>,

    /// API key for the administration API
    #[arg(long, env = "SSADMIN_API_KEY", hide_env_values = true)]
    #[serde(default)]
    pub(crate) api_key: Option<SecretString>,

    /// Path of the administration API below the server URL
    #[arg(long, default_value = DEFAULT_API_BASE_PATH)]
    #[serde(default = "api_base_path")]
    pub(crate) api_base_path: String,

    /// Verbose program output
    #[clap(flatten)]
    #[serde(default = "verbosity")]
    pub(crate) verbose: Verbosity,

    /// Show per-host rate limiting statistics at the end of the run
    #[arg(long)]
    #[serde(default)]
    pub(crate) host_stats: bool,

    /// Number of times the call is sent
    #[arg(long, default_value = &REPEAT_STR)]
    #[serde(default = "repeat")]
    pub(crate) repeat: usize,

    /// Maximum number of calls in flight at the same time
    #[arg(long, default_value = &CONCURRENCY_STR)]
    #[serde(default = "concurrency")]
    pub(crate) concurrency: usize,

    /// Number of threads to utilize.
    /// Defaults to number of cores available to the system
    #[arg(short = 'T', long)]
    #[serde(default)]
    pub(crate) threads: Option<usize>,

    /// User agent
    #[arg(short, long, default_value = DEFAULT_USER_AGENT)]
    #[serde(default = "user_agent")]
    pub(crate) user_agent: String,

    /// Proceed for server connections considered insecure (invalid TLS)
    #[arg(short, long)]
    #[serde(default)]
    pub(crate) insecure: bool,

    /// Set custom header for all calls
    #[arg(
        short = 'H',
        long,
        action = clap::ArgAction::Append,
        value_parser = HeaderParser,
        value_name = "HEADER:VALUE",
        long_help = "Set custom header for all calls

Specify custom headers in the format 'Name: Value'. For example, 'Accept: application/json'.
Multiple headers can be specified by using the flag multiple times.
Use `--request-header` for headers that belong to a single call only."
    )]
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_headers")]
    pub header: Vec<(String, String)>,

    /// Response timeout in seconds from connect to response finished
    #[arg(short, long, default_value = &TIMEOUT_STR)]
    #[serde(default = "timeout")]
    pub(crate) timeout: usize,

    /// Maximum calls per host within the short window
    #[arg(long)]
    #[serde(default)]
    pub(crate) short_ceiling: Option<usize>,

    /// Duration of the short window, e.g. `1s`
    #[arg(long, value_parser = humantime::parse_duration)]
    #[serde(default, with = "humantime_serde")]
    pub(crate) short_window: Option<Duration>,

    /// Maximum calls per host within the long window
    #[arg(long)]
    #[serde(default)]
    pub(crate) long_ceiling: Option<usize>,

    /// Duration of the long window, e.g. `1m`
    #[arg(long, value_parser = humantime::parse_duration)]
    #[serde(default, with = "humantime_serde")]
    pub(crate) long_window: Option<Duration>,

    /// Delay applied once a host reached either ceiling, e.g. `500ms`
    #[arg(long, value_parser = humantime::parse_duration)]
    #[serde(default, with = "humantime_serde")]
    pub(crate) backoff: Option<Duration>,

    /// Set the output display mode. Determines whether output is colored
    #[arg(long, default_value = "color", value_parser = PossibleValuesParser::new(OutputMode::VARIANTS).map(|s| s.parse::<OutputMode>().unwrap()))]
    #[serde(default)]
    pub(crate) mode: OutputMode,

    /// Output format of responses, failures and statistics
    #[arg(short, long, default_value = "compact", value_parser = PossibleValuesParser::new(OutputFormat::VARIANTS).map(|s| s.parse::<OutputFormat>().unwrap()))]
    #[serde(default)]
    pub(crate) format: OutputFormat,

    /// Host-specific configurations from config file
    #[arg(skip)]
    #[serde(default)]
    pub(crate) hosts: HostConfigs,
}

impl Config {
    /// The global rate limits, with defaults for every option left unset
    pub(crate) fn rate_limits(&self) -> RateLimitConfig {
        RateLimitConfig::from_options(
            self.short_ceiling,
            self.short_window,
            self.long_ceiling,
            self.long_window,
            self.backoff,
        )
    }

    /// Special handling for merging headers
    ///
    /// Overwrites existing headers in `self` with the values from `other`.
    fn merge_headers(&mut self, other: &[(String, String)]) {
        let self_map = self.header.iter().cloned().collect::<HashMap<_, _>>();
        let other_map = other.iter().cloned().collect::<HashMap<_, _>>();

        // Merge the two maps, with `other` taking precedence
        let merged_map: HashMap<_, _> = self_map.into_iter().chain(other_map).collect();

        // Convert the merged map back to a Vec of tuples
        self.header = merged_map.into_iter().collect();
    }

    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        // Read configuration file
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }

    /// Merge the configuration from TOML into the CLI configuration
    pub(crate) fn merge(&mut self, toml: Config) {
        // Special handling for headers before fold_in!
        self.merge_headers(&toml.header);

        // If the config file has an API key, but the CLI doesn't, use the
        // key from the config file.
        // This is outside of fold_in! because SecretBox doesn't implement Eq.
        if self.api_key.is_none() && toml.api_key.is_some() {
            self.api_key = toml.api_key;
        }

        // Hosts configuration is only available in TOML
        self.hosts = toml.hosts;

        // NOTE: if you see an error within this macro call, check to make sure that
        // that the fields provided to fold_in! match all the fields of the Config struct.
        fold_in! {
            // Destination and source configs
            self, toml;

            Config {
                // Keys which are handled outside of fold_in
                ..header,
                ..api_key,
                ..hosts,

                // Keys with defaults to assign
                api_base_path: DEFAULT_API_BASE_PATH,
                backoff: None,
                concurrency: DEFAULT_CONCURRENCY,
                format: OutputFormat::default(),
                host_stats: false,
                insecure: false,
                long_ceiling: None,
                long_window: None,
                mode: OutputMode::Color,
                repeat: DEFAULT_REPEAT,
                security_server: None,
                short_ceiling: None,
                short_window: None,
                threads: None,
                timeout: DEFAULT_TIMEOUT_SECS,
                user_agent: DEFAULT_USER_AGENT,
                verbose: Verbosity::default(),
            }
        }
    }
}
