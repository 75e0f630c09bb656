//! Client Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A download client error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for download client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The client could not be reached, or the connection dropped.
    #[display("network error")]
    Network,
    /// The client rejected the configured credentials.
    #[display("unauthorized: check the configured username and password")]
    Unauthorized,
    /// The client answered, but refused the request.
    #[display("client refused request: {_0}")]
    Rpc(#[error(not(source))] String),
    /// The client answered with something that isn't a valid response.
    #[display("invalid response from client")]
    InvalidResponse,
    /// The client could not be constructed from the given settings.
    #[display("invalid client configuration: {_0}")]
    Configuration(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Rpc(_))
    }
}
