//! Per-viewer registry entry

use crate::viewer::Viewer;

/// Entry for a single registered viewer
#[derive(Debug, Clone)]
pub struct ViewerEntry {
    /// Identity and display name
    pub viewer: Viewer,

    /// Last reported readiness position (None = not confirmed yet)
    pub readiness: Option<f64>,

    /// Registration order, used to list viewers deterministically
    pub(super) seq: u64,
}

impl ViewerEntry {
    pub(super) fn new(viewer: Viewer, seq: u64) -> Self {
        Self {
            viewer,
            readiness: None,
            seq,
        }
    }

    /// Whether the last readiness report is within `epsilon` of `when`
    pub fn is_ready_at(&self, when: f64, epsilon: f64) -> bool {
        match self.readiness {
            Some(reported) => (reported - when).abs() <= epsilon,
            None => false,
        }
    }
}
