//! Registry error types

use crate::viewer::ViewerId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Viewer is not registered
    ViewerNotFound(ViewerId),
    /// Viewer is already registered
    AlreadyRegistered(ViewerId),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::ViewerNotFound(id) => write!(f, "Viewer not found: {}", id),
            RegistryError::AlreadyRegistered(id) => write!(f, "Viewer already registered: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}
