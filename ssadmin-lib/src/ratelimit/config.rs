use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::ratelimit::HostKey;

/// Default number of calls allowed per host within the short window
pub const DEFAULT_SHORT_CEILING: usize = 20;

/// Default duration of the short window
pub const DEFAULT_SHORT_WINDOW: Duration = Duration::from_secs(1);

/// Default number of calls allowed per host within the long window
pub const DEFAULT_LONG_CEILING: usize = 600;

/// Default duration of the long window
pub const DEFAULT_LONG_WINDOW: Duration = Duration::from_secs(60);

/// Default delay applied once a ceiling is reached
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Global rate limiting configuration that applies as defaults to all hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum calls per host within `short_window` before delaying
    #[serde(default = "default_short_ceiling")]
    pub short_ceiling: usize,

    /// Duration of the short sliding window
    #[serde(default = "default_short_window", with = "humantime_serde")]
    pub short_window: Duration,

    /// Maximum calls per host within `long_window` before delaying
    #[serde(default = "default_long_ceiling")]
    pub long_ceiling: usize,

    /// Duration of the long sliding window
    #[serde(default = "default_long_window", with = "humantime_serde")]
    pub long_window: Duration,

    /// Flat delay applied once when either ceiling is reached
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            short_ceiling: DEFAULT_SHORT_CEILING,
            short_window: DEFAULT_SHORT_WINDOW,
            long_ceiling: DEFAULT_LONG_CEILING,
            long_window: DEFAULT_LONG_WINDOW,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

const fn default_short_ceiling() -> usize {
    DEFAULT_SHORT_CEILING
}

const fn default_short_window() -> Duration {
    DEFAULT_SHORT_WINDOW
}

const fn default_long_ceiling() -> usize {
    DEFAULT_LONG_CEILING
}

const fn default_long_window() -> Duration {
    DEFAULT_LONG_WINDOW
}

const fn default_backoff() -> Duration {
    DEFAULT_BACKOFF
}

impl RateLimitConfig {
    /// Create a `RateLimitConfig` from CLI options, using defaults for missing values
    #[must_use]
    pub fn from_options(
        short_ceiling: Option<usize>,
        short_window: Option<Duration>,
        long_ceiling: Option<usize>,
        long_window: Option<Duration>,
        backoff: Option<Duration>,
    ) -> Self {
        Self {
            short_ceiling: short_ceiling.unwrap_or(DEFAULT_SHORT_CEILING),
            short_window: short_window.unwrap_or(DEFAULT_SHORT_WINDOW),
            long_ceiling: long_ceiling.unwrap_or(DEFAULT_LONG_CEILING),
            long_window: long_window.unwrap_or(DEFAULT_LONG_WINDOW),
            backoff: backoff.unwrap_or(DEFAULT_BACKOFF),
        }
    }
}

/// Per-host configuration overrides
pub type HostConfigs = HashMap<HostKey, HostConfig>;

/// Configuration overrides for a specific host.
///
/// Every field left unset falls back to the global [`RateLimitConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Maximum calls within the short window
    pub short_ceiling: Option<usize>,

    /// Duration of the short window
    #[serde(default, with = "humantime_serde")]
    pub short_window: Option<Duration>,

    /// Maximum calls within the long window
    pub long_ceiling: Option<usize>,

    /// Duration of the long window
    #[serde(default, with = "humantime_serde")]
    pub long_window: Option<Duration>,

    /// Delay applied when a ceiling is reached
    #[serde(default, with = "humantime_serde")]
    pub backoff: Option<Duration>,
}

impl HostConfig {
    /// Resolve the limits for this host, falling back to the global defaults
    #[must_use]
    pub fn effective(&self, global_config: &RateLimitConfig) -> RateLimitConfig {
        RateLimitConfig {
            short_ceiling: self.short_ceiling.unwrap_or(global_config.short_ceiling),
            short_window: self.short_window.unwrap_or(global_config.short_window),
            long_ceiling: self.long_ceiling.unwrap_or(global_config.long_ceiling),
            long_window: self.long_window.unwrap_or(global_config.long_window),
            backoff: self.backoff.unwrap_or(global_config.backoff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_rate_limit_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.short_ceiling, 20);
        assert_eq!(config.short_window, Duration::from_secs(1));
        assert_eq!(config.long_ceiling, 600);
        assert_eq!(config.long_window, Duration::from_secs(60));
        assert_eq!(config.backoff, Duration::from_secs(1));
    }

    #[test]
    fn test_from_options_fills_missing_values() {
        let config =
            RateLimitConfig::from_options(Some(5), None, None, Some(Duration::from_secs(30)), None);
        assert_eq!(config.short_ceiling, 5);
        assert_eq!(config.short_window, DEFAULT_SHORT_WINDOW);
        assert_eq!(config.long_ceiling, DEFAULT_LONG_CEILING);
        assert_eq!(config.long_window, Duration::from_secs(30));
        assert_eq!(config.backoff, DEFAULT_BACKOFF);
    }

    #[test]
    fn test_host_config_effective_values() {
        let global_config = RateLimitConfig::default();

        // Test with no overrides
        let host_config = HostConfig::default();
        assert_eq!(host_config.effective(&global_config), global_config);

        // Test with overrides
        let host_config = HostConfig {
            short_ceiling: Some(2),
            backoff: Some(Duration::from_millis(250)),
            ..HostConfig::default()
        };
        let effective = host_config.effective(&global_config);
        assert_eq!(effective.short_ceiling, 2);
        assert_eq!(effective.backoff, Duration::from_millis(250));
        assert_eq!(effective.long_ceiling, 600);
    }

    #[test]
    fn test_config_serialization() {
        let config = RateLimitConfig {
            short_ceiling: 15,
            short_window: Duration::from_millis(500),
            long_ceiling: 100,
            long_window: Duration::from_secs(120),
            backoff: Duration::from_secs(2),
        };

        let toml = toml::to_string(&config).unwrap();
        let deserialized: RateLimitConfig = toml::from_str(&toml).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_host_config_from_toml() {
        let host_config: HostConfig = toml::from_str(
            r#"
            long_ceiling = 100
            backoff = "500ms"
            "#,
        )
        .unwrap();

        assert_eq!(host_config.long_ceiling, Some(100));
        assert_eq!(host_config.backoff, Some(Duration::from_millis(500)));
        assert_eq!(host_config.short_ceiling, None);
        assert_eq!(host_config.short_window, None);
    }

    #[test]
    fn test_host_config_rejects_unknown_fields() {
        let result: Result<HostConfig, _> = toml::from_str("concurrency = 4");
        assert!(result.is_err());
    }
}
