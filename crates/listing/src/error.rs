//! Listing Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A listing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for listing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File or directory does not exist
    #[display("not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Path is not usable as a listing root (relative, or not a directory)
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The listing program could not be located on the system
    #[display("listing program not found: {_0}")]
    ProgramNotFound(#[error(not(source))] String),
    /// The listing program ran but reported failure
    #[display("listing program failed with exit code: {}", _0.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    CommandFailed(#[error(not(source))] Option<i32>),
    /// The remote listing could not be produced for another reason
    #[display("remote listing unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::CommandFailed(_) | Self::Unavailable(_))
    }
}
