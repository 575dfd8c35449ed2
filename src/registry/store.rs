//! Viewer registry implementation

use std::collections::HashMap;

use super::entry::ViewerEntry;
use super::error::RegistryError;
use crate::viewer::{Viewer, ViewerId};

/// Registered viewers and their last readiness reports
///
/// Owned by the coordinator task, so no locking is needed.
#[derive(Debug, Default)]
pub struct ViewerRegistry {
    /// Map of viewer ID to entry
    viewers: HashMap<ViewerId, ViewerEntry>,

    /// Next registration sequence number
    next_seq: u64,
}

impl ViewerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer with unknown readiness
    pub fn register(&mut self, viewer: Viewer) -> Result<(), RegistryError> {
        if self.viewers.contains_key(&viewer.id) {
            return Err(RegistryError::AlreadyRegistered(viewer.id));
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        tracing::debug!(viewer = %viewer, "Viewer registered");
        self.viewers.insert(viewer.id, ViewerEntry::new(viewer, seq));
        Ok(())
    }

    /// Remove a viewer and its readiness entry
    pub fn unregister(&mut self, id: ViewerId) -> Option<Viewer> {
        self.viewers.remove(&id).map(|entry| {
            tracing::debug!(viewer = %entry.viewer, "Viewer unregistered");
            entry.viewer
        })
    }

    /// Record the last readiness timestamp reported by a viewer
    pub fn set_readiness(&mut self, id: ViewerId, when: f64) -> Result<(), RegistryError> {
        let entry = self
            .viewers
            .get_mut(&id)
            .ok_or(RegistryError::ViewerNotFound(id))?;
        entry.readiness = Some(when);
        Ok(())
    }

    /// Get a viewer's entry
    pub fn get(&self, id: ViewerId) -> Option<&ViewerEntry> {
        self.viewers.get(&id)
    }

    /// Check whether a viewer is registered
    pub fn contains(&self, id: ViewerId) -> bool {
        self.viewers.contains_key(&id)
    }

    /// Number of registered viewers
    pub fn count(&self) -> usize {
        self.viewers.len()
    }

    /// Whether no viewers are registered
    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    /// All entries in registration order
    pub fn entries(&self) -> Vec<&ViewerEntry> {
        let mut entries: Vec<&ViewerEntry> = self.viewers.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    /// All registered viewers in registration order
    pub fn all(&self) -> Vec<Viewer> {
        self.entries()
            .into_iter()
            .map(|entry| entry.viewer.clone())
            .collect()
    }

    /// Check that every registered viewer has confirmed readiness at `when`
    ///
    /// An empty registry is never "all ready".
    pub fn all_ready_at(&self, when: f64, epsilon: f64) -> bool {
        !self.viewers.is_empty()
            && self
                .viewers
                .values()
                .all(|entry| entry.is_ready_at(when, epsilon))
    }

    /// Rename a registered viewer
    pub fn rename(&mut self, id: ViewerId, name: impl Into<String>) -> Result<(), RegistryError> {
        let entry = self
            .viewers
            .get_mut(&id)
            .ok_or(RegistryError::ViewerNotFound(id))?;
        entry.viewer.name = name.into();
        Ok(())
    }
}
