//! Illegal transition errors

use super::state::SyncMode;

/// A requested transition is not valid from the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// Rewinding needs an agreed pause position
    CannotRewind { mode: SyncMode },
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::CannotRewind { mode } => write!(f, "Cannot rewind from state = {}", mode),
        }
    }
}

impl std::error::Error for SyncError {}
