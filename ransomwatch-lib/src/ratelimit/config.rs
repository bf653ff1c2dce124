use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Hard upper bound for the per-minute request cap
pub const MAX_REQUESTS_PER_MINUTE: u32 = 60;

/// Hard upper bound for the per-second request cap
pub const MAX_REQUESTS_PER_SECOND: u32 = 10;

/// Smallest accepted spacing between two consecutive requests
pub const MIN_INTERVAL_FLOOR: Duration = Duration::from_millis(100);

/// Default per-minute request cap
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 30;

/// Default per-second request cap
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 2;

/// Default minimum spacing between requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Throttling configuration for a [`crate::ratelimit::RateLimiter`].
///
/// Values outside the safe operating ranges are clamped rather than
/// rejected: per-minute to `1..=60`, per-second to `1..=10`, and the
/// minimum interval to at least 100ms. Clamping happens when the limiter
/// is created, so a config read from CLI flags or a file never produces
/// an unusable limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum admissions in any sliding 60-second window
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Maximum admissions in any sliding 1-second window
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Minimum spacing between two consecutive admissions
    #[serde(default = "default_min_interval", with = "humantime_serde")]
    pub min_interval: Duration,
}

// Functions for serde defaults
const fn default_requests_per_minute() -> u32 {
    DEFAULT_REQUESTS_PER_MINUTE
}

const fn default_requests_per_second() -> u32 {
    DEFAULT_REQUESTS_PER_SECOND
}

const fn default_min_interval() -> Duration {
    DEFAULT_MIN_INTERVAL
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

impl RateLimitConfig {
    /// Create a config from raw values, clamping each to its safe range.
    #[must_use]
    pub fn clamped(
        requests_per_minute: u32,
        requests_per_second: u32,
        min_interval: Duration,
    ) -> Self {
        Self {
            requests_per_minute,
            requests_per_second,
            min_interval,
        }
        .clamp()
    }

    /// Return a copy with every field forced into its safe range.
    #[must_use]
    pub fn clamp(self) -> Self {
        Self {
            requests_per_minute: self.requests_per_minute.clamp(1, MAX_REQUESTS_PER_MINUTE),
            requests_per_second: self.requests_per_second.clamp(1, MAX_REQUESTS_PER_SECOND),
            min_interval: self.min_interval.max(MIN_INTERVAL_FLOOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_minute, 30);
        assert_eq!(config.requests_per_second, 2);
        assert_eq!(config.min_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_clamping() {
        let config = RateLimitConfig::clamped(120, 50, Duration::ZERO);
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.min_interval, Duration::from_millis(100));

        let config = RateLimitConfig::clamped(0, 0, Duration::from_secs(2));
        assert_eq!(config.requests_per_minute, 1);
        assert_eq!(config.requests_per_second, 1);
        assert_eq!(config.min_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_config_serialization() {
        let config = RateLimitConfig {
            requests_per_minute: 15,
            requests_per_second: 3,
            min_interval: Duration::from_millis(200),
        };

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: RateLimitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_config_defaults_from_empty_document() {
        let config: RateLimitConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RateLimitConfig::default());
    }
}
