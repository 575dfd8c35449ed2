//! Synchronization state

use crate::viewer::{Viewer, ViewerId};

/// Discriminant of [`SyncState`], used in logs and operator messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// See [`SyncState::Init`]
    Init,
    /// See [`SyncState::Paused`]
    Paused,
    /// See [`SyncState::WaitingForReady`]
    WaitingForReady,
    /// See [`SyncState::WaitingForWhenReports`]
    WaitingForWhenReports,
    /// See [`SyncState::Playing`]
    Playing,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncMode::Init => "init",
            SyncMode::Paused => "paused",
            SyncMode::WaitingForReady => "waitingForReady",
            SyncMode::WaitingForWhenReports => "waitingForWhenReports",
            SyncMode::Playing => "playing",
        };
        f.write_str(name)
    }
}

/// Position reports collected after playback was interrupted
#[derive(Debug, Clone, PartialEq)]
pub struct WhenReports {
    /// Viewers that were registered when the reports were requested
    pub in_sync: Vec<Viewer>,

    /// Reports received so far, in arrival order
    pub reports: Vec<(Viewer, f64)>,

    /// Position playback was last started from
    pub last_reported_when: f64,
}

impl WhenReports {
    /// Start collecting reports from `in_sync`
    pub fn new(in_sync: Vec<Viewer>, last_reported_when: f64) -> Self {
        Self {
            in_sync,
            reports: Vec::new(),
            last_reported_when,
        }
    }

    /// Report received from a viewer, if any
    pub fn report_for(&self, id: ViewerId) -> Option<f64> {
        self.reports
            .iter()
            .find(|(viewer, _)| viewer.id == id)
            .map(|(_, when)| *when)
    }

    /// Record a report, replacing an earlier one from the same viewer
    pub fn record(&mut self, viewer: Viewer, when: f64) {
        match self.reports.iter_mut().find(|(v, _)| v.id == viewer.id) {
            Some(entry) => entry.1 = when,
            None => self.reports.push((viewer, when)),
        }
    }

    /// Forget a viewer that left
    pub fn remove(&mut self, id: ViewerId) {
        self.in_sync.retain(|viewer| viewer.id != id);
        self.reports.retain(|(viewer, _)| viewer.id != id);
    }

    /// Earliest position reported so far
    pub fn earliest_report(&self) -> Option<f64> {
        self.reports.iter().map(|(_, when)| *when).reduce(f64::min)
    }

    /// Consensus position once every in-sync viewer has reported
    ///
    /// The minimum is used so no viewer has to seek past content it has not
    /// buffered yet. Reports from viewers outside `in_sync` are kept but do
    /// not count. With nobody left in sync, any report received (or the last
    /// start position) stands in.
    pub fn consensus(&self) -> Option<f64> {
        if self.in_sync.is_empty() {
            return Some(self.earliest_report().unwrap_or(self.last_reported_when));
        }

        let mut consensus = f64::INFINITY;
        for viewer in &self.in_sync {
            consensus = consensus.min(self.report_for(viewer.id)?);
        }
        Some(consensus)
    }
}

/// The single shared playback state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncState {
    /// No viewer has joined yet; no position established
    #[default]
    Init,
    /// Everyone is believed to be paused at `when`
    Paused { when: f64 },
    /// Everyone was told to pause at `when`; waiting for readiness
    WaitingForReady { when: f64 },
    /// Playback was interrupted; waiting for position reports
    WaitingForWhenReports(WhenReports),
    /// Everyone was told to play, starting from `from`
    Playing { from: f64 },
}

impl SyncState {
    /// Discriminant of this state
    pub fn mode(&self) -> SyncMode {
        match self {
            SyncState::Init => SyncMode::Init,
            SyncState::Paused { .. } => SyncMode::Paused,
            SyncState::WaitingForReady { .. } => SyncMode::WaitingForReady,
            SyncState::WaitingForWhenReports(_) => SyncMode::WaitingForWhenReports,
            SyncState::Playing { .. } => SyncMode::Playing,
        }
    }

    /// The agreed or targeted pause position, if the state has one
    pub fn pause_position(&self) -> Option<f64> {
        match self {
            SyncState::Paused { when } | SyncState::WaitingForReady { when } => Some(*when),
            SyncState::Init | SyncState::WaitingForWhenReports(_) | SyncState::Playing { .. } => {
                None
            }
        }
    }

    /// Position to fall back to when the room empties
    pub fn best_known_position(&self) -> Option<f64> {
        match self {
            SyncState::Paused { when } | SyncState::WaitingForReady { when } => Some(*when),
            SyncState::WaitingForWhenReports(reports) => reports.earliest_report(),
            SyncState::Init | SyncState::Playing { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(name: &str) -> Viewer {
        Viewer::new(ViewerId::new(), name)
    }

    #[test]
    fn test_consensus_waits_for_everyone() {
        let (a, b, c) = (viewer("a"), viewer("b"), viewer("c"));
        let mut reports = WhenReports::new(vec![a.clone(), b.clone(), c.clone()], 0.0);

        reports.record(a, 5.0);
        reports.record(b, 5.3);
        assert_eq!(reports.consensus(), None);

        reports.record(c, 4.8);
        assert_eq!(reports.consensus(), Some(4.8));
    }

    #[test]
    fn test_record_replaces_previous_report() {
        let a = viewer("a");
        let mut reports = WhenReports::new(vec![a.clone()], 0.0);

        reports.record(a.clone(), 9.0);
        reports.record(a.clone(), 7.0);

        assert_eq!(reports.reports.len(), 1);
        assert_eq!(reports.report_for(a.id), Some(7.0));
    }

    #[test]
    fn test_outsider_report_does_not_count() {
        let (a, late) = (viewer("a"), viewer("late"));
        let mut reports = WhenReports::new(vec![a.clone()], 0.0);

        reports.record(late, 0.0);
        assert_eq!(reports.consensus(), None);

        reports.record(a, 30.0);
        assert_eq!(reports.consensus(), Some(30.0));
    }

    #[test]
    fn test_remove_and_empty_in_sync() {
        let (a, late) = (viewer("a"), viewer("late"));
        let mut reports = WhenReports::new(vec![a.clone()], 12.0);

        reports.record(a.clone(), 20.0);
        reports.remove(a.id);
        assert!(reports.in_sync.is_empty());
        assert_eq!(reports.consensus(), Some(12.0));

        reports.record(late, 18.0);
        assert_eq!(reports.consensus(), Some(18.0));
    }

    #[test]
    fn test_best_known_position() {
        assert_eq!(SyncState::Init.best_known_position(), None);
        assert_eq!(SyncState::Playing { from: 3.0 }.best_known_position(), None);
        assert_eq!(
            SyncState::WaitingForReady { when: 7.0 }.best_known_position(),
            Some(7.0)
        );

        let a = viewer("a");
        let mut reports = WhenReports::new(vec![a.clone()], 0.0);
        assert_eq!(
            SyncState::WaitingForWhenReports(reports.clone()).best_known_position(),
            None
        );
        reports.record(a, 41.0);
        assert_eq!(
            SyncState::WaitingForWhenReports(reports).best_known_position(),
            Some(41.0)
        );
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(SyncMode::WaitingForWhenReports.to_string(), "waitingForWhenReports");
        assert_eq!(SyncState::Paused { when: 1.0 }.mode(), SyncMode::Paused);
    }
}
