//! Sync Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The client could not remove a former version.
    #[display("cannot remove {_0}")]
    Remove(#[error(not(source))] String),
    /// The client could not queue the newest version of a library name.
    #[display("cannot fetch {_0}")]
    Add(#[error(not(source))] String),
    /// The repository could not be opened for scanning.
    #[display("cannot scan repository")]
    Scan,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remove(_) | Self::Add(_))
    }
}
