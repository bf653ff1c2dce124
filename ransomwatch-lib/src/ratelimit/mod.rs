//! Client-side rate limiting for outbound API requests.
//!
//! The limiter throttles under three simultaneous constraints:
//!
//! - a cap on requests per sliding 60-second window,
//! - a cap on requests per sliding 1-second window,
//! - a minimum interval between consecutive requests.
//!
//! All three are evaluated together and the *maximum* required wait is
//! applied, so the constraints never compound into back-to-back sleeps.
//!
//! A [`RateLimiter`] is owned by one API client session and shared between
//! concurrent callers behind an `Arc`. It never rejects a caller; it only
//! delays admission.

mod config;
mod limiter;
mod stats;

pub use config::{
    RateLimitConfig, DEFAULT_MIN_INTERVAL, DEFAULT_REQUESTS_PER_MINUTE,
    DEFAULT_REQUESTS_PER_SECOND, MAX_REQUESTS_PER_MINUTE, MAX_REQUESTS_PER_SECOND,
    MIN_INTERVAL_FLOOR,
};
pub use limiter::RateLimiter;
pub use stats::RateLimitStats;
