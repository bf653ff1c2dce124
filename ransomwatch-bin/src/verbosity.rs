//! `-v`/`-q` flags for adjusting log output
//!
//! By default only errors, warnings, and progress messages are shown.
//! - `-v` enables debug logging, `-vv` trace
//! - `-q` drops to warnings, `-qq` to errors only

use log::{Level, LevelFilter};

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Verbosity {
    /// More output per occurrence
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet",
    )]
    verbose: u8,

    /// Less output per occurrence
    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "verbose",
    )]
    quiet: u8,
}

impl Verbosity {
    /// Get the log level filter.
    pub(crate) fn log_level_filter(&self) -> LevelFilter {
        level_enum(self.verbosity()).to_level_filter()
    }

    /// Whether the user explicitly asked for more output via `-v`.
    pub(crate) const fn is_verbose(&self) -> bool {
        self.verbose > 0
    }

    #[allow(clippy::cast_possible_wrap)]
    const fn verbosity(&self) -> i8 {
        level_value(Level::Info) - (self.quiet as i8) + (self.verbose as i8)
    }

    #[cfg(test)]
    pub(crate) const fn with_verbose(verbose: u8) -> Self {
        Self { verbose, quiet: 0 }
    }

    #[cfg(test)]
    pub(crate) const fn with_quiet(quiet: u8) -> Self {
        Self { verbose: 0, quiet }
    }
}

const fn level_value(level: Level) -> i8 {
    match level {
        Level::Error => 0,
        Level::Warn => 1,
        Level::Info => 2,
        Level::Debug => 3,
        Level::Trace => 4,
    }
}

const fn level_enum(verbosity: i8) -> Level {
    match verbosity {
        i8::MIN..=0 => Level::Error,
        1 => Level::Warn,
        2 => Level::Info,
        3 => Level::Debug,
        4..=i8::MAX => Level::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_app() {
        #[derive(Debug, clap::Parser)]
        struct Cli {
            #[clap(flatten)]
            verbose: Verbosity,
        }

        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_log_level() {
        let verbosity = Verbosity::default();
        assert_eq!(verbosity.log_level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_quiet_saturates_at_error() {
        let verbosity = Verbosity {
            verbose: 0,
            quiet: 5,
        };
        assert_eq!(verbosity.log_level_filter(), LevelFilter::Error);
    }

    #[test]
    fn test_verbose_raises_level() {
        let verbosity = Verbosity {
            verbose: 1,
            quiet: 0,
        };
        assert_eq!(verbosity.log_level_filter(), LevelFilter::Debug);
    }
}
