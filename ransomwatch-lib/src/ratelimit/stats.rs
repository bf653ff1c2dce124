use std::time::Duration;

use serde::Serialize;

/// A read-only snapshot of the limiter state, exposed for diagnostics.
///
/// Taking a snapshot performs the same sliding-window purge as an
/// admission, so the counts are accurate at the moment of observation,
/// but it records nothing.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStats {
    /// Admissions within the trailing 60-second window
    pub requests_last_minute: usize,
    /// Admissions within the trailing 1-second window
    pub requests_last_second: usize,
    /// Configured per-minute cap (after clamping)
    pub max_requests_per_minute: u32,
    /// Configured per-second cap (after clamping)
    pub max_requests_per_second: u32,
    /// Configured minimum spacing (after clamping)
    #[serde(with = "humantime_serde")]
    pub min_interval: Duration,
    /// Time elapsed since the most recent admission, `None` before the
    /// first request of the session
    #[serde(with = "humantime_serde")]
    pub time_since_last_request: Option<Duration>,
}
