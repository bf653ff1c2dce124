//! The request gate: the single choke point every API call passes through.
//!
//! For each call the gate builds the fully-qualified, percent-encoded URL,
//! checks it against the [`UrlPolicy`], and only then asks the rate
//! limiter for admission. Validation failure is a value-level rejection;
//! a rate limit is never a rejection, only a bounded delay.

use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::ratelimit::RateLimiter;
use crate::sanitize::sanitize_url;
use crate::validate::{Invalid, UrlPolicy};

/// Base URL of the production API
pub const API_BASE: &str = "https://api-pro.ransomware.live";

/// Characters escaped when a caller-supplied value becomes a path segment.
/// Everything except unreserved characters gets encoded; normalized group
/// names are already `[a-z0-9-]`, so this is the second line of defense.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A request that made it through validation and rate limiting.
#[derive(Debug, Clone)]
pub struct Admitted {
    /// The validated, fully-qualified request URL
    pub url: Url,
    /// How long the rate limiter delayed this caller
    pub waited: Duration,
}

/// Gates every outbound request: URL construction, policy validation,
/// then rate-limiter admission.
///
/// Holds no per-call state; each [`RequestGate::pass`] is an independent
/// decision sequence.
#[derive(Debug, Clone)]
pub struct RequestGate {
    base: Url,
    policy: UrlPolicy,
    limiter: Arc<RateLimiter>,
}

impl RequestGate {
    /// Create a gate for the given API base URL.
    pub fn new(base: Url, policy: UrlPolicy, limiter: Arc<RateLimiter>) -> Self {
        Self {
            base,
            policy,
            limiter,
        }
    }

    /// Build the request URL for an endpoint plus an optional
    /// percent-encoded path component.
    #[must_use]
    pub fn build_url(&self, endpoint: &str, path_component: Option<&str>) -> Url {
        let mut path = String::from("/");
        path.push_str(endpoint.trim_matches('/'));
        if let Some(component) = path_component {
            path.push('/');
            path.push_str(&utf8_percent_encode(component, PATH_SEGMENT).to_string());
        }
        let mut url = self.base.clone();
        url.set_path(&path);
        url
    }

    /// Decide whether a request may proceed: build the URL, validate it
    /// against the policy, then wait for rate-limiter admission.
    ///
    /// A rejection means the URL failed validation and the request must
    /// not be sent. Admission may block, but always eventually succeeds.
    ///
    /// # Errors
    ///
    /// Returns the [`Invalid`] reason when the constructed URL violates
    /// the policy.
    pub async fn pass(
        &self,
        endpoint: &str,
        path_component: Option<&str>,
    ) -> Result<Admitted, Invalid> {
        let url = self.build_url(endpoint, path_component);
        if let Err(reason) = self.policy.check(&url) {
            log::debug!("Gate rejected URL {}: {reason}", sanitize_url(&url));
            return Err(reason);
        }
        let waited = self.limiter.admit().await;
        Ok(Admitted { url, waited })
    }

    /// The rate limiter behind this gate.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
