//! `ransomwatch-lib` is a client library for the ransomware.live
//! threat intelligence API.
//!
//! Every outbound request goes through two gates before it touches the
//! network: strict allow-list validation of the target URL and a
//! client-side rate limiter which enforces a per-minute cap, a per-second
//! cap, and a minimum spacing between requests.
//!
//! ```no_run
//! use ransomwatch_lib::{ClientBuilder, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ClientBuilder::builder()
//!         .api_token(String::from("changeme"))
//!         .build()
//!         .client()?;
//!     let groups = client.groups().await?;
//!     println!("{groups}");
//!     Ok(())
//! }
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![deny(missing_docs)]

mod client;
mod gate;
mod types;

pub mod ratelimit;
pub mod sanitize;
pub mod validate;

pub use client::{
    Client, ClientBuilder, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_WAIT_TIME_SECS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
pub use gate::{Admitted, RequestGate, API_BASE};
pub use types::{ErrorKind, Result};
