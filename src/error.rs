//! Command-line Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A fatal error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for the command-line entry point.
pub type Result<T> = std::result::Result<T, Error>;

/// Conditions that stop a run before any change is requested.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("cannot read library file {}", _0.display())]
    Library(#[error(not(source))] PathBuf),
    #[display("repository is not an accessible directory: {}", _0.display())]
    Repository(#[error(not(source))] PathBuf),
    #[display("cannot load configuration")]
    Config,
    /// The download client could not be built.
    #[display("cannot set up {_0}")]
    Setup(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Library(_) => 1,
            Self::Repository(_) => 2,
            Self::Config | Self::Setup(_) => 3,
        }
    }
}
