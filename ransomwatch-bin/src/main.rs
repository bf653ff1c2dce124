//! `ransomwatch` is a read-only CLI for the ransomware.live threat
//! intelligence API.
//!
//! Every request passes strict input validation, a URL allow-list, and a
//! client-side rate limiter before it leaves the machine. The API token
//! is read from the `RANSOMWATCH_API_TOKEN` environment variable only.
//!
//! List active groups:
//! ```sh
//! ransomwatch groups
//! ```
//!
//! Show the 20 most recent victims:
//! ```sh
//! ransomwatch recent -l 20
//! ```
//!
//! Detail view for one group:
//! ```sh
//! ransomwatch info --group lockbit3
//! ```
//!
//! Aggregate statistics, throttled harder than the defaults:
//! ```sh
//! ransomwatch --rate-limit-per-minute 10 stats
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

use std::process::exit;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use ransomwatch_lib::{Client, ClientBuilder};
use secrecy::SecretString;

use crate::formatters::log::init_logging;
use crate::options::{API_TOKEN_VAR, Command, RansomwatchOptions};

mod formatters;
mod options;
mod verbosity;

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to
    // `main()` using the `?` operator, which covers network failures and
    // unexpected API responses.
    #[allow(unused)]
    UnexpectedFailure = 1,
    InvalidArguments = 2,
    MissingToken = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Parse and validate arguments, then set up the runtime and call the
/// entrypoint.
fn run_main() -> Result<i32> {
    let opts = RansomwatchOptions::parse();
    init_logging(&opts.verbose, &opts.mode, opts.json);

    if let Err(reason) = opts.validate() {
        error!("Invalid arguments: {reason}");
        exit(ExitCode::InvalidArguments as i32);
    }

    let Some(token) = api_token() else {
        error!("No API token provided. Set the {API_TOKEN_VAR} environment variable.");
        error!("Example: export {API_TOKEN_VAR}=your_token");
        exit(ExitCode::MissingToken as i32);
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(&opts, token))
}

/// Read the API token from the environment. Empty or whitespace-only
/// values count as missing.
fn api_token() -> Option<SecretString> {
    match std::env::var(API_TOKEN_VAR) {
        Ok(token) if !token.trim().is_empty() => Some(SecretString::from(token)),
        _ => None,
    }
}

/// Run the requested command against the API and print the result.
async fn run(opts: &RansomwatchOptions, token: SecretString) -> Result<i32> {
    let client: Client = ClientBuilder::builder()
        .api_token(token)
        .timeout(Duration::from_secs(opts.timeout))
        .max_retries(opts.max_retries)
        .rate_limit(opts.rate_limit())
        .build()
        .client()?;

    let output = match &opts.command {
        Command::Groups => {
            if !opts.json {
                info!("Fetching ransomware groups...");
            }
            let data = client.groups().await?;
            if opts.json {
                serde_json::to_string_pretty(&data)?
            } else {
                formatters::report::groups(&data, &opts.mode)?
            }
        }
        Command::Recent { limit } => {
            if !opts.json {
                info!("Fetching {limit} recent victims...");
            }
            let data = client.recent_victims().await?;
            if opts.json {
                serde_json::to_string_pretty(&formatters::report::truncated_victims(
                    &data, *limit,
                )?)?
            } else {
                formatters::report::recent_victims(&data, *limit, &opts.mode)?
            }
        }
        Command::Info { group } => {
            if !opts.json {
                info!("Fetching group information...");
            }
            let data = client.group_info(group).await?;
            if opts.json {
                serde_json::to_string_pretty(&data)?
            } else {
                formatters::report::group_info(&data, group, &opts.mode)?
            }
        }
        Command::Stats => {
            if !opts.json {
                info!("Fetching statistics...");
            }
            let data = client.stats().await?;
            if opts.json {
                serde_json::to_string_pretty(&data)?
            } else {
                formatters::report::stats(&data, &opts.mode)?
            }
        }
        Command::RateLimitStats => {
            // Local diagnostic; never produces an API request
            serde_json::to_string_pretty(&client.rate_limit_stats().await)?
        }
    };

    println!("{output}");
    Ok(ExitCode::Success as i32)
}
