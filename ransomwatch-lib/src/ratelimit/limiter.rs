use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use super::{RateLimitConfig, RateLimitStats};

/// Length of the sliding window backing the per-minute cap
const WINDOW: Duration = Duration::from_secs(60);

/// Length of the sliding window backing the per-second cap
const SECOND: Duration = Duration::from_secs(1);

/// Mutable limiter state, only ever touched while holding the lock.
#[derive(Debug, Default)]
struct State {
    /// Admission timestamps, oldest first, pruned to the trailing
    /// 60-second window on every access
    admitted: VecDeque<Instant>,
    /// Timestamp of the most recent admission
    last_admitted: Option<Instant>,
}

impl State {
    /// Drop timestamps that have aged out of the 60-second window.
    /// Bounds memory and keeps the per-minute check O(window size).
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.duration_since(oldest) > WINDOW {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    fn within_last_second(&self, now: Instant) -> usize {
        // The deque is ordered, so counting from the back would suffice,
        // but the window holds at most 60 entries. Keep it obvious.
        self.admitted
            .iter()
            .filter(|&&t| now.duration_since(t) < SECOND)
            .count()
    }

    fn record(&mut self, now: Instant) {
        self.admitted.push_back(now);
        self.last_admitted = Some(now);
    }
}

/// Throttles outbound requests under three simultaneous constraints:
/// per-minute cap, per-second cap, and minimum inter-request spacing.
///
/// Safe to share between concurrent callers; the admission algorithm runs
/// under a mutex, but the lock is *not* held across the sleep, so
/// [`RateLimiter::stats`] stays responsive while callers wait.
///
/// The limiter never rejects and never errors. Every caller is eventually
/// admitted; the only effect is a bounded delay.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<State>,
}

impl RateLimiter {
    /// Create a limiter from the given config, clamping it to safe bounds
    /// (see [`RateLimitConfig::clamp`]).
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        let config = config.clamp();
        log::debug!(
            "Rate limiter initialized: {}/min, {}/sec, min interval {}",
            config.requests_per_minute,
            config.requests_per_second,
            humantime::format_duration(config.min_interval)
        );
        Self {
            config,
            state: Mutex::new(State::default()),
        }
    }

    /// The effective (clamped) configuration.
    #[must_use]
    pub const fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Wait until a request may proceed, then record the admission.
    ///
    /// Evaluates all three constraints and sleeps for the maximum required
    /// wait, outside the lock. Because the lock is released during the
    /// sleep, the state is re-evaluated afterwards; the loop runs until no
    /// constraint demands a wait, so the invariants hold for every
    /// admission regardless of how many callers contend.
    ///
    /// Returns the total time this caller waited. The future is safe to
    /// drop mid-wait; a cancelled caller leaves no trace in the window.
    pub async fn admit(&self) -> Duration {
        let started = Instant::now();
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                match required_wait(&self.config, &mut state, now) {
                    None => {
                        state.record(now);
                        return started.elapsed();
                    }
                    Some(wait) => wait,
                }
            };
            log::debug!(
                "Rate limiting: waiting {}",
                humantime::format_duration(wait)
            );
            sleep(wait).await;
        }
    }

    /// Take a read-only snapshot of the limiter state.
    ///
    /// Purges the sliding window like an admission does, for accuracy,
    /// but records nothing.
    pub async fn stats(&self) -> RateLimitStats {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.prune(now);
        RateLimitStats {
            requests_last_minute: state.admitted.len(),
            requests_last_second: state.within_last_second(now),
            max_requests_per_minute: self.config.requests_per_minute,
            max_requests_per_second: self.config.requests_per_second,
            min_interval: self.config.min_interval,
            time_since_last_request: state.last_admitted.map(|t| now.duration_since(t)),
        }
    }
}

/// Evaluate all three constraints against the pruned window and return the
/// maximum wait any of them demands, or `None` if a request may proceed
/// immediately.
fn required_wait(config: &RateLimitConfig, state: &mut State, now: Instant) -> Option<Duration> {
    state.prune(now);
    let mut wait = Duration::ZERO;

    if state.admitted.len() >= config.requests_per_minute as usize {
        if let Some(&oldest) = state.admitted.front() {
            let elapsed = now.duration_since(oldest);
            if elapsed < WINDOW {
                wait = wait.max(WINDOW - elapsed);
            }
        }
    }

    if state.within_last_second(now) >= config.requests_per_second as usize {
        wait = wait.max(SECOND);
    }

    if let Some(last) = state.last_admitted {
        let since = now.duration_since(last);
        if since < config.min_interval {
            wait = wait.max(config.min_interval - since);
        }
    }

    (!wait.is_zero()).then_some(wait)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn limiter(per_minute: u32, per_second: u32, min_interval: Duration) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::clamped(
            per_minute,
            per_second,
            min_interval,
        ))
    }

    /// Caps chosen so that only the constraint under test can trigger.
    const UNLIMITED: u32 = u32::MAX;

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let limiter = limiter(30, 2, Duration::from_millis(500));
        assert_eq!(limiter.admit().await, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_min_interval_spacing() {
        let limiter = limiter(UNLIMITED, UNLIMITED, Duration::from_millis(500));

        limiter.admit().await;
        let first = Instant::now();
        let waited = limiter.admit().await;
        let gap = Instant::now().duration_since(first);

        assert!(gap >= Duration::from_millis(500), "gap was {gap:?}");
        // Reported wait matches the measured delay
        assert_eq!(waited, gap);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_second_cap() {
        let limiter = limiter(UNLIMITED, 2, Duration::from_millis(100));

        let mut admissions = Vec::new();
        for _ in 0..5 {
            limiter.admit().await;
            admissions.push(Instant::now());
        }

        for window_start in &admissions {
            let in_window = admissions
                .iter()
                .filter(|t| {
                    **t >= *window_start
                        && t.duration_since(*window_start) < Duration::from_secs(1)
                })
                .count();
            assert!(in_window <= 2, "{in_window} admissions within one second");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_minute_cap() {
        let limiter = limiter(2, UNLIMITED, Duration::from_millis(100));

        limiter.admit().await;
        let first = Instant::now();
        limiter.admit().await;
        limiter.admit().await;
        let third = Instant::now();

        // The third admission had to wait for the first to age out
        assert!(third.duration_since(first) >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_do_not_compound() {
        // Both the per-second cap and the min interval apply to the second
        // request; the limiter should wait for the larger requirement only.
        let limiter = limiter(UNLIMITED, 1, Duration::from_millis(800));

        limiter.admit().await;
        let first = Instant::now();
        limiter.admit().await;
        let gap = Instant::now().duration_since(first);

        assert!(gap >= Duration::from_secs(1));
        assert!(gap < Duration::from_millis(1900), "waits compounded: {gap:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_respect_per_second_cap() {
        let limiter = Arc::new(limiter(UNLIMITED, 2, Duration::from_millis(100)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move {
                limiter.admit().await;
                Instant::now()
            }));
        }

        let mut admissions = Vec::new();
        for handle in handles {
            admissions.push(handle.await.unwrap());
        }
        admissions.sort();

        for window_start in &admissions {
            let in_window = admissions
                .iter()
                .filter(|t| {
                    **t >= *window_start
                        && t.duration_since(*window_start) < Duration::from_secs(1)
                })
                .count();
            assert!(in_window <= 2, "{in_window} admissions within one second");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_snapshot() {
        let limiter = limiter(30, UNLIMITED, Duration::from_millis(100));

        let stats = limiter.stats().await;
        assert_eq!(stats.requests_last_minute, 0);
        assert_eq!(stats.requests_last_second, 0);
        assert_eq!(stats.time_since_last_request, None);

        limiter.admit().await;
        limiter.admit().await;

        let stats = limiter.stats().await;
        assert_eq!(stats.requests_last_minute, 2);
        // Both admissions are 100ms apart, well within the last second
        assert_eq!(stats.requests_last_second, 2);
        assert_eq!(stats.max_requests_per_minute, 30);
        assert!(stats.time_since_last_request.is_some());

        // Snapshots record nothing
        let again = limiter.stats().await;
        assert_eq!(again.requests_last_minute, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_purges_aged_entries() {
        let limiter = limiter(30, UNLIMITED, Duration::from_millis(100));
        limiter.admit().await;

        tokio::time::advance(Duration::from_secs(61)).await;

        let stats = limiter.stats().await;
        assert_eq!(stats.requests_last_minute, 0);
        assert_eq!(stats.requests_last_second, 0);
    }
}
