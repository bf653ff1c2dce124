use std::time::Duration;

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand, builder::TypedValueParser};
use const_format::concatcp;
use ransomwatch_lib::ratelimit::{
    DEFAULT_REQUESTS_PER_MINUTE, DEFAULT_REQUESTS_PER_SECOND, RateLimitConfig,
};
use ransomwatch_lib::validate::{self, Invalid};
use ransomwatch_lib::{DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use strum::{Display, EnumString, VariantNames};

use crate::verbosity::Verbosity;

/// The only place an API token is read from. Flags or config files would
/// leak the token into shell history or the process list.
pub(crate) const API_TOKEN_VAR: &str = "RANSOMWATCH_API_TOKEN";

const DEFAULT_RECENT_LIMIT: u64 = 10;
const DEFAULT_MIN_INTERVAL: &str = "500ms";

// this exists because clap requires `&str` type values for defaults
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS);
const MAX_RETRIES_STR: &str = concatcp!(DEFAULT_MAX_RETRIES);
const REQUESTS_PER_MINUTE_STR: &str = concatcp!(DEFAULT_REQUESTS_PER_MINUTE);
const REQUESTS_PER_SECOND_STR: &str = concatcp!(DEFAULT_REQUESTS_PER_SECOND);
const RECENT_LIMIT_STR: &str = concatcp!(DEFAULT_RECENT_LIMIT);

/// The different formatter modes
///
/// This decides over whether to use color or plain text for the output.
#[derive(Debug, Default, Clone, Display, EnumString, VariantNames, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) enum OutputMode {
    /// Plain text output, for terminals without color support or for
    /// piping into other programs
    #[strum(serialize = "plain", ascii_case_insensitive)]
    Plain,

    /// Colorful output. This is the default.
    #[default]
    #[strum(serialize = "color", ascii_case_insensitive)]
    Color,
}

impl OutputMode {
    pub(crate) fn is_plain(&self) -> bool {
        self == &Self::Plain
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ransomwatch",
    version,
    about = "Ransomware intelligence from the ransomware.live API",
    after_help = "examples:\n  \
        ransomwatch groups\n  \
        ransomwatch recent -l 20\n  \
        ransomwatch info --group lockbit3\n  \
        ransomwatch stats\n  \
        ransomwatch --rate-limit-per-minute 10 groups"
)]
pub(crate) struct RansomwatchOptions {
    #[command(flatten)]
    pub(crate) verbose: Verbosity,

    /// Request timeout in seconds
    #[arg(long, default_value = &TIMEOUT_STR)]
    pub(crate) timeout: u64,

    /// Maximum number of retries per failed request
    #[arg(long, default_value = &MAX_RETRIES_STR)]
    pub(crate) max_retries: u64,

    /// Print the raw API response as JSON instead of formatted text
    #[arg(long)]
    pub(crate) json: bool,

    /// Set the output display mode. Determines how results are presented
    /// in the terminal
    #[arg(long, default_value = "color", value_parser = PossibleValuesParser::new(OutputMode::VARIANTS).map(|s| s.parse::<OutputMode>().unwrap()))]
    pub(crate) mode: OutputMode,

    /// Maximum API requests per minute. Values outside 1 to 60 are
    /// clamped to that range
    #[arg(long, default_value = &REQUESTS_PER_MINUTE_STR)]
    pub(crate) rate_limit_per_minute: u32,

    /// Maximum API requests per second. Values outside 1 to 10 are
    /// clamped to that range
    #[arg(long, default_value = &REQUESTS_PER_SECOND_STR)]
    pub(crate) rate_limit_per_second: u32,

    /// Minimum spacing between two consecutive requests. Anything below
    /// 100ms is raised to 100ms
    #[arg(long, value_parser = humantime::parse_duration, default_value = DEFAULT_MIN_INTERVAL)]
    pub(crate) min_interval: Duration,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub(crate) enum Command {
    /// List active ransomware groups
    Groups,
    /// Show recently discovered victims
    Recent {
        /// Number of victims to display (1 to 1000)
        #[arg(short, long, default_value = &RECENT_LIMIT_STR)]
        limit: u64,
    },
    /// Show details for a single group
    Info {
        /// Group name (case-insensitive)
        #[arg(long)]
        group: String,
    },
    /// Show aggregate statistics
    Stats,
    /// Show a snapshot of the client-side rate limiter
    RateLimitStats,
}

impl Command {
    /// The allow-listed API command name, or `None` for local commands
    /// that never produce a request.
    const fn api_name(&self) -> Option<&'static str> {
        match self {
            Command::Groups => Some("groups"),
            Command::Recent { .. } => Some("recent"),
            Command::Info { .. } => Some("info"),
            Command::Stats => Some("stats"),
            Command::RateLimitStats => None,
        }
    }
}

impl RansomwatchOptions {
    /// Re-check the parsed arguments against the strict allow-lists.
    ///
    /// clap already constrains the shape of the input, but the same
    /// validators run again here (and once more inside the library) so a
    /// value can never reach the request path on the strength of a single
    /// check.
    pub(crate) fn validate(&self) -> Result<(), Invalid> {
        if let Some(name) = self.command.api_name() {
            validate::validate_command(name)?;
        }
        validate::validate_timeout(self.timeout)?;
        match &self.command {
            Command::Recent { limit } => validate::validate_limit(*limit)?,
            Command::Info { group } => validate::validate_group_name(group)?,
            Command::Groups | Command::Stats | Command::RateLimitStats => {}
        }
        Ok(())
    }

    /// Throttling configuration from the rate limit flags, clamped to the
    /// safe operating ranges.
    pub(crate) fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::clamped(
            self.rate_limit_per_minute,
            self.rate_limit_per_second,
            self.min_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn verify_app() {
        RansomwatchOptions::command().debug_assert();
    }

    fn parse(args: &[&str]) -> RansomwatchOptions {
        RansomwatchOptions::try_parse_from(
            std::iter::once("ransomwatch").chain(args.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&["groups"]);
        assert_eq!(opts.timeout, 10);
        assert_eq!(opts.max_retries, 3);
        assert_eq!(opts.rate_limit_per_minute, 30);
        assert_eq!(opts.rate_limit_per_second, 2);
        assert_eq!(opts.min_interval, Duration::from_millis(500));
        assert_eq!(opts.mode, OutputMode::Color);
        assert!(!opts.json);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert_eq!(parse(&["groups"]).validate(), Ok(()));
        assert_eq!(parse(&["recent", "-l", "20"]).validate(), Ok(()));
        assert_eq!(parse(&["info", "--group", "lockbit3"]).validate(), Ok(()));
        assert_eq!(parse(&["stats"]).validate(), Ok(()));
        assert_eq!(parse(&["rate-limit-stats"]).validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_timeout() {
        assert_eq!(
            parse(&["--timeout", "0", "groups"]).validate(),
            Err(Invalid::Timeout)
        );
        assert_eq!(
            parse(&["--timeout", "301", "groups"]).validate(),
            Err(Invalid::Timeout)
        );
    }

    #[test]
    fn test_validate_rejects_bad_limit() {
        assert_eq!(
            parse(&["recent", "--limit", "0"]).validate(),
            Err(Invalid::Limit)
        );
        assert_eq!(
            parse(&["recent", "--limit", "1001"]).validate(),
            Err(Invalid::Limit)
        );
    }

    #[test]
    fn test_validate_rejects_bad_group_name() {
        assert_eq!(
            parse(&["info", "--group", "../etc"]).validate(),
            Err(Invalid::GroupName)
        );
        assert_eq!(
            parse(&["info", "--group", "<script>"]).validate(),
            Err(Invalid::GroupName)
        );
    }

    #[test]
    fn test_rate_limit_flags_are_clamped() {
        let opts = parse(&[
            "--rate-limit-per-minute",
            "500",
            "--rate-limit-per-second",
            "50",
            "--min-interval",
            "1ms",
            "groups",
        ]);
        let config = opts.rate_limit();
        assert_eq!(config.requests_per_minute, 60);
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.min_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_min_interval_accepts_humantime() {
        let opts = parse(&["--min-interval", "2s", "groups"]);
        assert_eq!(opts.min_interval, Duration::from_secs(2));
    }
}
