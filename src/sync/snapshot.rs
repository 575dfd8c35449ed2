//! Serialized state for controllers
//!
//! Viewer identities become `{id, name}` objects and the report map becomes
//! an ordered list of `[viewer, when]` pairs.

use serde::{Deserialize, Serialize};

use super::state::SyncState;
use crate::viewer::Viewer;

/// Wire form of [`SyncState`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SyncSnapshot {
    #[default]
    Init,
    Paused {
        when: f64,
    },
    WaitingForReady {
        when: f64,
    },
    #[serde(rename_all = "camelCase")]
    WaitingForWhenReports {
        in_sync: Vec<Viewer>,
        when_reports: Vec<(Viewer, f64)>,
        last_reported_when: f64,
    },
    Playing,
}

impl From<&SyncState> for SyncSnapshot {
    fn from(state: &SyncState) -> Self {
        match state {
            SyncState::Init => SyncSnapshot::Init,
            SyncState::Paused { when } => SyncSnapshot::Paused { when: *when },
            SyncState::WaitingForReady { when } => SyncSnapshot::WaitingForReady { when: *when },
            SyncState::WaitingForWhenReports(reports) => SyncSnapshot::WaitingForWhenReports {
                in_sync: reports.in_sync.clone(),
                when_reports: reports.reports.clone(),
                last_reported_when: reports.last_reported_when,
            },
            SyncState::Playing { .. } => SyncSnapshot::Playing,
        }
    }
}
