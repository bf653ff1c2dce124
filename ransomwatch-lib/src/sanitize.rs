//! Sanitization helpers for anything that might end up in a log line.
//!
//! Credentials travel in headers and env vars, and user input is
//! untrusted; both are scrubbed before logging. Error-level messages in
//! this crate avoid untrusted content entirely, so these helpers mostly
//! guard debug-level output.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Patterns matching credential material, each paired with its redaction.
static SENSITIVE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Assignment form only; the header form is matched below so the
        // header name survives redaction
        (
            Regex::new(r"(?i)api[_-]?key=[^\s&]+").unwrap(),
            "[API_KEY_REDACTED]",
        ),
        (
            Regex::new(r"(?i)token[=:]\s*[^\s&]+").unwrap(),
            "[TOKEN_REDACTED]",
        ),
        (
            Regex::new(r"(?i)password[=:]\s*[^\s&]+").unwrap(),
            "[PASSWORD_REDACTED]",
        ),
        (
            Regex::new(r"(?i)secret[=:]\s*[^\s&]+").unwrap(),
            "[SECRET_REDACTED]",
        ),
        (
            Regex::new(r"(?i)x-api-key:\s*\S+").unwrap(),
            "X-API-KEY: [REDACTED]",
        ),
        (
            Regex::new(r"(?i)authorization:\s*(bearer\s+)?\S+").unwrap(),
            "Authorization: [REDACTED]",
        ),
    ]
});

/// Redact credential material from a message before it is logged.
#[must_use]
pub fn sanitize_log(message: &str) -> String {
    let mut sanitized = Cow::Borrowed(message);
    for (pattern, replacement) in SENSITIVE_PATTERNS.iter() {
        if pattern.is_match(&sanitized) {
            sanitized = Cow::Owned(pattern.replace_all(&sanitized, *replacement).into_owned());
        }
    }
    sanitized.into_owned()
}

/// Render a URL for logging: scheme, host, and path only, with any query
/// string replaced by a marker.
#[must_use]
pub fn sanitize_url(url: &Url) -> String {
    let mut safe = format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    );
    if url.query().is_some() {
        safe.push_str("?[QUERY_REDACTED]");
    }
    safe
}

/// A short, character-escaped excerpt of untrusted input, for debug-level
/// logging of rejected values. Truncates to `max` characters and replaces
/// markup characters so the excerpt is inert wherever it lands.
#[must_use]
pub fn excerpt(input: &str, max: usize) -> String {
    input
        .chars()
        .take(max)
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '<' => '[',
            '>' => ']',
            '&' => '+',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_sanitize_log_redacts_credentials() {
        assert_eq!(
            sanitize_log("request failed: api_key=abc123&page=2"),
            "request failed: [API_KEY_REDACTED]&page=2"
        );
        assert_eq!(
            sanitize_log("header X-API-KEY: s3cr3t rejected"),
            "header X-API-KEY: [REDACTED] rejected"
        );
        assert_eq!(sanitize_log("nothing to hide"), "nothing to hide");
    }

    #[test]
    fn test_sanitize_url_strips_query() {
        let url = Url::parse("https://api-pro.ransomware.live/groups?api_key=abc").unwrap();
        assert_eq!(
            sanitize_url(&url),
            "https://api-pro.ransomware.live/groups?[QUERY_REDACTED]"
        );

        let url = Url::parse("https://api-pro.ransomware.live/stats").unwrap();
        assert_eq!(sanitize_url(&url), "https://api-pro.ransomware.live/stats");
    }

    #[test]
    fn test_excerpt_escapes_and_truncates() {
        assert_eq!(excerpt("<script>alert(1)</script>", 20), "[script]alert(1)[/sc");
        assert_eq!(excerpt("a\0b\nc", 10), "abc");
        assert_eq!(excerpt("lockbit3", 20), "lockbit3");
    }
}
