use std::io::Write;

use env_logger::{Builder, Env};
use log::LevelFilter;

use crate::{formatters, options::OutputMode, verbosity::Verbosity};

/// Initialize the logging system with the given verbosity level.
///
/// With `--json`, progress logging is cut back to warnings unless the
/// user explicitly asked for more, so stdout stays machine-readable.
pub(crate) fn init_logging(verbose: &Verbosity, mode: &OutputMode, json: bool) {
    // Set a base level for all modules to `warn`, which is a reasonable
    // default. It will be overridden by RUST_LOG if it's set.
    let env = Env::default().filter_or("RUST_LOG", "warn");

    let mut builder = Builder::from_env(env);
    builder
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    if std::env::var("RUST_LOG").is_err() {
        // Adjust the base log level filter based on the verbosity from
        // the CLI. This applies to all modules not explicitly mentioned
        // in RUST_LOG.
        let level_filter = base_level_filter(verbose, json);

        builder.filter_level(LevelFilter::Info);

        // More specific filters for our own crates, enabling more verbose
        // logging as per `-vv`.
        builder
            .filter_module("ransomwatch", level_filter)
            .filter_module("ransomwatch_lib", level_filter);
    }

    if mode.is_plain() {
        // Explicitly disable colors for plain output
        builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    } else {
        builder.format(|buf, record| {
            let level = record.level();
            let color = formatters::color::color_for_level(level);
            writeln!(
                buf,
                "{} {}",
                color.apply_to(format!("[{level}]")),
                record.args()
            )
        });
    }

    builder.init();
}

/// Level filter for our own crates, derived from `-v`/`-q` and `--json`.
///
/// An explicit `-v` wins over the JSON clamp so debugging stays possible
/// even when stdout carries machine-readable output.
fn base_level_filter(verbose: &Verbosity, json: bool) -> LevelFilter {
    let level_filter = verbose.log_level_filter();
    if json && !verbose.is_verbose() && level_filter > LevelFilter::Warn {
        return LevelFilter::Warn;
    }
    level_filter
}
