//! Strict allow-list validation for everything that crosses a trust
//! boundary: commands, numeric options, group names, and request URLs.
//!
//! All predicates are pure and stateless. They are called once by the CLI
//! layer before dispatch and again inside the API layer before a request
//! is built, so a value that slips past one boundary is still caught at
//! the next.
//!
//! Rejections carry a generic [`Invalid`] reason; the offending raw input
//! is never echoed back (see [`crate::sanitize::excerpt`] for the
//! debug-level escape hatch).

use std::collections::HashSet;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use strum::{Display, EnumString, VariantNames};
use thiserror::Error;
use url::Url;

/// Smallest accepted request timeout, in seconds
pub const MIN_TIMEOUT_SECS: u64 = 1;
/// Largest accepted request timeout, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 300;
/// Smallest accepted result limit
pub const MIN_LIMIT: u64 = 1;
/// Largest accepted result limit
pub const MAX_LIMIT: u64 = 1000;
/// Longest accepted group name before normalization
pub const MAX_GROUP_NAME_LEN: usize = 100;

/// The only host API requests may be sent to
pub const API_HOST: &str = "api-pro.ransomware.live";

/// Shape every normalized group name must match
static NORMALIZED_GROUP_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]{1,50}$").unwrap());

/// Why a value was rejected.
///
/// Display strings are generic on purpose: they are shown to users and
/// written to logs, and must not leak the rejected input.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Invalid {
    /// Not one of the allow-listed commands
    #[error("invalid command provided")]
    Command,
    /// Timeout outside `1..=300` seconds
    #[error("timeout must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS} seconds")]
    Timeout,
    /// Result limit outside `1..=1000`
    #[error("limit must be between {MIN_LIMIT} and {MAX_LIMIT}")]
    Limit,
    /// Group name empty, too long, or containing disallowed characters
    #[error("group name contains invalid characters or has invalid length")]
    GroupName,
    /// Group name became empty or malformed after normalization
    #[error("group name is invalid after normalization")]
    NormalizedGroupName,
    /// URL scheme not on the allow-list
    #[error("invalid URL scheme, only HTTPS is allowed")]
    UrlScheme,
    /// URL host resolves to a private, link-local, or loopback address
    #[error("URL host points to a private or local address")]
    PrivateHost,
    /// URL host not on the allow-list
    #[error("invalid domain, only approved domains are allowed")]
    UrlHost,
    /// URL carries no host at all
    #[error("URL is missing a host")]
    MissingHost,
}

/// The read-only API operations this client may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantNames)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    /// List active ransomware groups
    Groups,
    /// List recently discovered victims
    Recent,
    /// Detail view for a single group
    Info,
    /// Aggregate statistics
    Stats,
}

impl Command {
    /// The API path this command maps to, relative to the base URL.
    ///
    /// [`Command::Info`] shares the groups collection; the group name is
    /// appended as a separate, percent-encoded path segment.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Groups | Self::Info => "/groups",
            Self::Recent => "/victims/recent",
            Self::Stats => "/stats",
        }
    }
}

/// Accept only the allow-listed command names.
///
/// # Errors
///
/// Returns [`Invalid::Command`] for anything outside the allow-list.
pub fn validate_command(command: &str) -> Result<Command, Invalid> {
    Command::from_str(command).map_err(|_| Invalid::Command)
}

/// Accept timeouts within `1..=300` seconds.
///
/// # Errors
///
/// Returns [`Invalid::Timeout`] outside that range.
pub const fn validate_timeout(timeout_secs: u64) -> Result<(), Invalid> {
    if timeout_secs >= MIN_TIMEOUT_SECS && timeout_secs <= MAX_TIMEOUT_SECS {
        Ok(())
    } else {
        Err(Invalid::Timeout)
    }
}

/// Accept result limits within `1..=1000`.
///
/// # Errors
///
/// Returns [`Invalid::Limit`] outside that range.
pub const fn validate_limit(limit: u64) -> Result<(), Invalid> {
    if limit >= MIN_LIMIT && limit <= MAX_LIMIT {
        Ok(())
    } else {
        Err(Invalid::Limit)
    }
}

/// Syntactic validation of a raw group name, before normalization.
///
/// Rejects empty names, names longer than 100 characters, and names
/// containing markup, quoting, path, or NUL characters, including the
/// `..` traversal sequence.
///
/// # Errors
///
/// Returns [`Invalid::GroupName`] on any violation.
pub fn validate_group_name(name: &str) -> Result<(), Invalid> {
    if name.is_empty() || name.chars().count() > MAX_GROUP_NAME_LEN {
        return Err(Invalid::GroupName);
    }
    if name.contains(['<', '>', '&', '"', '\'', '/', '\\', '\0']) || name.contains("..") {
        return Err(Invalid::GroupName);
    }
    Ok(())
}

/// Normalize a group name into the canonical form used as an API path
/// segment.
///
/// Two-stage filter: the name must pass [`validate_group_name`] first, so
/// disallowed characters are rejected rather than silently stripped. Only
/// then is it trimmed, lower-cased, and reduced to `[a-z0-9-]`. Stripping
/// can still reject: an emptied result or one failing the final
/// `^[a-z0-9-]{1,50}$` shape check is refused. The double check guards
/// against encoding tricks that a single pass could let through.
///
/// # Errors
///
/// Returns [`Invalid::GroupName`] when syntactic validation fails and
/// [`Invalid::NormalizedGroupName`] when normalization empties or
/// malforms the name.
pub fn normalize_group_name(name: &str) -> Result<String, Invalid> {
    validate_group_name(name)?;

    let normalized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();

    if normalized.is_empty() || !NORMALIZED_GROUP_NAME.is_match(&normalized) {
        return Err(Invalid::NormalizedGroupName);
    }
    Ok(normalized)
}

/// Allow-list policy every request URL must satisfy before it reaches the
/// rate limiter.
///
/// Initialized once and never mutated afterwards. The default policy
/// admits only `https` URLs for the production API host and blocks hosts
/// that name private, link-local, loopback, or unspecified addresses.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    /// Accepted URL schemes
    pub allowed_schemes: HashSet<String>,
    /// Accepted hosts, matched against the literal host string
    pub allowed_hosts: HashSet<String>,
    /// Reject hosts naming private/local addresses, even allow-listed ones
    pub block_private_hosts: bool,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: HashSet::from(["https".to_string()]),
            allowed_hosts: HashSet::from([API_HOST.to_string()]),
            block_private_hosts: true,
        }
    }
}

impl UrlPolicy {
    /// Check a URL against this policy: scheme allow-list, then the
    /// private-address blocklist, then the host allow-list. The blocklist
    /// runs before the allow-list so a private address is reported as
    /// such, independent of whether it was ever allow-listed.
    ///
    /// # Errors
    ///
    /// Returns the [`Invalid`] reason of the first check that fails.
    pub fn check(&self, url: &Url) -> Result<(), Invalid> {
        if !self.allowed_schemes.contains(url.scheme()) {
            return Err(Invalid::UrlScheme);
        }
        let host = url.host_str().ok_or(Invalid::MissingHost)?;
        if self.block_private_hosts && is_private_host(url) {
            return Err(Invalid::PrivateHost);
        }
        if !self.allowed_hosts.contains(host) {
            return Err(Invalid::UrlHost);
        }
        Ok(())
    }
}

/// Whether the URL host names a private, link-local, loopback, or
/// unspecified address, or is the `localhost` alias.
///
/// Note: IPv4-mapped IPv6 addresses are intentionally not unwrapped to
/// their IPv4 form (RFC 4291 §2.5.5.2); an IPv6 literal is judged as IPv6.
fn is_private_host(url: &Url) -> bool {
    let ip = match url.host() {
        Some(url::Host::Domain(domain)) => return domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(url::Host::Ipv6(v6)) => IpAddr::V6(v6),
        None => return false,
    };
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}
