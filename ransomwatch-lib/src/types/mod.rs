//! Shared types for `ransomwatch-lib`.

mod error;

pub use error::ErrorKind;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, ErrorKind>;
