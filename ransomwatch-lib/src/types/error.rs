use http::StatusCode;
use thiserror::Error;

use crate::validate::Invalid;

/// Possible errors when interacting with `ransomwatch_lib`.
///
/// Display strings are intentionally generic. Raw user input and full
/// request URLs never appear in error messages; detail is only available
/// at debug log level, after sanitization.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Network error while talking to the API endpoint
    #[error("Connection failed - check your internet connection")]
    NetworkRequest(#[source] reqwest::Error),
    /// The request did not complete within the configured timeout
    #[error("Request timed out; try increasing the timeout")]
    Timeout,
    /// The API answered with a non-success status code
    #[error("API request failed with status {0}")]
    UnexpectedStatus(StatusCode),
    /// The response body could not be decoded as JSON
    #[error("Invalid JSON response from API")]
    ReadResponseBody(#[source] reqwest::Error),
    /// The constructed request URL failed allow-list validation
    #[error("URL validation failed for API request")]
    InvalidApiUrl(#[source] Invalid),
    /// A caller-supplied value failed validation
    #[error("Input failed validation: {0}")]
    InvalidInput(#[source] Invalid),
    /// The underlying HTTP client could not be constructed
    #[error("Failed to build the request client")]
    BuildRequestClient(#[source] reqwest::Error),
    /// A header value (e.g. the API token) could not be parsed
    #[error("Header could not be parsed")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}
