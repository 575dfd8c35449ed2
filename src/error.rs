//! Error types
//!
//! Crate-wide error type. Protocol and transition errors are surfaced to the
//! caller as response strings; only I/O and configuration errors are fatal.

use crate::sync::SyncError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for server and coordinator operations
#[derive(Debug)]
pub enum Error {
    /// Socket or file I/O failure
    Io(std::io::Error),
    /// Invalid configuration (e.g. only one of the TLS variables set)
    Config(String),
    /// The coordinator task has stopped and no longer accepts events
    CoordinatorClosed,
    /// A requested transition is not valid from the current state
    Sync(SyncError),
    /// Malformed request from a client
    Protocol(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::CoordinatorClosed => write!(f, "Coordinator is not running"),
            Error::Sync(e) => write!(f, "{}", e),
            Error::Protocol(msg) => write!(f, "Protocol error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Sync(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<SyncError> for Error {
    fn from(e: SyncError) -> Self {
        Error::Sync(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Protocol(e.to_string())
    }
}
