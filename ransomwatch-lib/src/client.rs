//! The API client: a thin wrapper around `reqwest` that routes every
//! operation through the [`RequestGate`] before anything touches the
//! network.
//!
//! [`ClientBuilder`] configures and constructs a [`Client`]; responses
//! are consumed as opaque JSON values and left to the caller to render.

use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::time::sleep;
use typed_builder::TypedBuilder;
use url::Url;

use crate::gate::{RequestGate, API_BASE};
use crate::ratelimit::{RateLimitConfig, RateLimitStats, RateLimiter};
use crate::sanitize::sanitize_url;
use crate::validate::{normalize_group_name, Command, UrlPolicy};
use crate::{ErrorKind, Result};

/// Default request timeout in seconds, 10.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retries before a request is deemed as failed, 3.
pub const DEFAULT_MAX_RETRIES: u64 = 3;
/// Default wait time in seconds before the first retry, 1. Doubles on
/// every subsequent retry.
pub const DEFAULT_RETRY_WAIT_TIME_SECS: u64 = 1;
/// Default user agent, `ransomwatch-<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("ransomwatch/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API token
const API_KEY_HEADER: &str = "x-api-key";

/// Status codes worth retrying; everything else fails immediately
const RETRY_STATUS_FORCELIST: [u16; 4] = [500, 502, 503, 504];

/// Builder for [`Client`].
///
/// Only the API token is required; every other field has a production
/// default. See crate-level documentation for a usage example.
#[derive(TypedBuilder, Debug)]
#[builder(field_defaults(default, setter(into)))]
pub struct ClientBuilder {
    /// Token sent in the `X-API-KEY` header with every request.
    /// Kept behind [`SecretString`] so it never lands in debug output.
    #[builder(!default)]
    api_token: SecretString,
    /// Response timeout per request
    #[builder(default = Duration::from_secs(DEFAULT_TIMEOUT_SECS))]
    timeout: Duration,
    /// User agent used for API requests
    #[builder(default = DEFAULT_USER_AGENT.to_string())]
    user_agent: String,
    /// Client-side throttling configuration, clamped on construction
    rate_limit: RateLimitConfig,
    /// Maximum number of retries per request before returning an error
    #[builder(default = DEFAULT_MAX_RETRIES)]
    max_retries: u64,
    /// Wait before the first retry; doubles per retry
    #[builder(default = Duration::from_secs(DEFAULT_RETRY_WAIT_TIME_SECS))]
    retry_wait_time: Duration,
    /// URL allow-list policy applied to every request
    policy: UrlPolicy,
    /// Override of the API base URL. `None` means the production API.
    api_base: Option<Url>,
}

impl ClientBuilder {
    /// Instantiate a [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the user agent or API token cannot be encoded
    /// as header values, or if the underlying request client cannot be
    /// created.
    pub fn client(self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);

        let mut token = HeaderValue::from_str(self.api_token.expose_secret().trim())?;
        token.set_sensitive(true);
        headers.insert(API_KEY_HEADER, token);

        let reqwest_client = reqwest::ClientBuilder::new()
            .gzip(true)
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(ErrorKind::BuildRequestClient)?;

        let base = match self.api_base {
            Some(base) => base,
            None => Url::parse(API_BASE).expect("base URL constant must parse"),
        };

        let limiter = Arc::new(RateLimiter::new(self.rate_limit));
        let gate = RequestGate::new(base, self.policy, Arc::clone(&limiter));

        Ok(Client {
            reqwest_client,
            gate,
            limiter,
            max_retries: self.max_retries,
            retry_wait_time: self.retry_wait_time,
        })
    }
}

/// Issues read-only requests against the ransomware.live API.
///
/// All operations are GET requests returning the response body as an
/// opaque [`Value`]; rendering is the caller's concern.
#[derive(Debug, Clone)]
pub struct Client {
    /// Underlying `reqwest` client handling the HTTP transport
    reqwest_client: reqwest::Client,
    /// Validates and rate-limits every request before it is sent
    gate: RequestGate,
    /// Shared with the gate; also admits retry attempts
    limiter: Arc<RateLimiter>,
    max_retries: u64,
    retry_wait_time: Duration,
}

impl Client {
    /// Fetch all active ransomware groups.
    ///
    /// # Errors
    ///
    /// Fails on URL rejection, network errors, non-success status codes,
    /// or an undecodable response body.
    pub async fn groups(&self) -> Result<Value> {
        self.get(Command::Groups.endpoint(), None).await
    }

    /// Fetch recently discovered victims.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Client::groups`].
    pub async fn recent_victims(&self) -> Result<Value> {
        self.get(Command::Recent.endpoint(), None).await
    }

    /// Fetch details for a single group.
    ///
    /// The name is normalized and validated here even if the caller
    /// already did so; this is the second validation site.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`] when the name fails
    /// validation, otherwise the same failure modes as [`Client::groups`].
    pub async fn group_info(&self, group_name: &str) -> Result<Value> {
        let normalized = normalize_group_name(group_name).map_err(ErrorKind::InvalidInput)?;
        self.get(Command::Info.endpoint(), Some(&normalized)).await
    }

    /// Fetch overall statistics.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Client::groups`].
    pub async fn stats(&self) -> Result<Value> {
        self.get(Command::Stats.endpoint(), None).await
    }

    /// Snapshot of the client-side rate limiter, for diagnostics.
    pub async fn rate_limit_stats(&self) -> RateLimitStats {
        self.limiter.stats().await
    }

    async fn get(&self, endpoint: &str, path_component: Option<&str>) -> Result<Value> {
        let admitted = self
            .gate
            .pass(endpoint, path_component)
            .await
            .map_err(ErrorKind::InvalidApiUrl)?;
        if !admitted.waited.is_zero() {
            log::debug!(
                "Rate limited: waited {} before request",
                humantime::format_duration(admitted.waited)
            );
        }
        log::debug!("GET {}", sanitize_url(&admitted.url));

        let mut attempt = 0;
        let mut wait = self.retry_wait_time;
        loop {
            match self.execute(admitted.url.clone()).await {
                Err(err) if attempt < self.max_retries && should_retry(&err) => {
                    attempt += 1;
                    log::debug!(
                        "Request failed ({err}), retry {attempt}/{} in {}",
                        self.max_retries,
                        humantime::format_duration(wait)
                    );
                    sleep(wait).await;
                    wait *= 2;
                    // A retry is a real request and counts against the limits
                    self.limiter.admit().await;
                }
                result => return result,
            }
        }
    }

    async fn execute(&self, url: Url) -> Result<Value> {
        let response = self.reqwest_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ErrorKind::Timeout
            } else {
                ErrorKind::NetworkRequest(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ErrorKind::UnexpectedStatus(status));
        }
        response.json().await.map_err(ErrorKind::ReadResponseBody)
    }
}

fn should_retry(err: &ErrorKind) -> bool {
    match err {
        ErrorKind::UnexpectedStatus(status) => RETRY_STATUS_FORCELIST.contains(&status.as_u16()),
        ErrorKind::NetworkRequest(e) => e.is_connect(),
        _ => false,
    }
}
