//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The filename stem has no version segment that can be isolated.
    #[display("cannot parse archive name: {_0}")]
    Parse(#[error(not(source))] String),
    /// The file does not carry the expected archive extension.
    #[display("not an archive ({extension}): {name}")]
    Extension {
        /// Expected extension, without the leading dot.
        extension: String,
        /// The offending file name.
        name: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A filename is either valid or it isn't.
        false
    }
}
