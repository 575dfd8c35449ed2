//! Synchronization state machine
//!
//! Every public method is one event. An event is fully resolved (including
//! any re-evaluation of a barrier) before it returns, and state is replaced
//! synchronously, so callers processing events one at a time never observe a
//! half-applied transition.

use super::config::SyncConfig;
use super::error::SyncError;
use super::snapshot::SyncSnapshot;
use super::state::{SyncState, WhenReports};
use crate::dispatch::{Desired, Dispatch, KickTarget};
use crate::registry::ViewerRegistry;
use crate::viewer::{Viewer, ViewerId};

/// Result of a `play` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Transitioned to playing and told everyone
    Started,
    /// Already playing; nothing sent
    AlreadyPlaying,
    /// Not paused, or nobody is connected
    NotPossible,
}

/// Result of a `pause` request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PauseOutcome {
    /// Everyone was told to pause at this position
    PausingAt(f64),
    /// Everyone was asked to pause and report their position
    CollectingPositions,
    /// Not valid in the current state; nothing sent
    Ignored,
}

/// The coordinator's decision engine
pub struct SyncMachine<D> {
    /// Current state, replaced wholesale on every transition
    state: SyncState,

    /// Registered viewers and readiness reports
    registry: ViewerRegistry,

    /// Outbound delivery
    dispatch: D,

    /// Tolerances
    config: SyncConfig,

    /// Set on every transition, cleared by [`take_dirty`](Self::take_dirty)
    dirty: bool,
}

impl<D: Dispatch> SyncMachine<D> {
    /// Create a machine in the `Init` state
    pub fn new(dispatch: D, config: SyncConfig) -> Self {
        Self {
            state: SyncState::Init,
            registry: ViewerRegistry::new(),
            dispatch,
            config,
            dirty: false,
        }
    }

    /// Current state
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Registered viewers
    pub fn registry(&self) -> &ViewerRegistry {
        &self.registry
    }

    /// Outbound dispatcher
    pub fn dispatch(&self) -> &D {
        &self.dispatch
    }

    /// Mutable outbound dispatcher (connection bookkeeping)
    pub fn dispatch_mut(&mut self) -> &mut D {
        &mut self.dispatch
    }

    /// Serialized form of the current state
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot::from(&self.state)
    }

    /// Whether the state changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    fn transition(&mut self, next: SyncState) {
        tracing::info!(
            from = %self.state.mode(),
            to = %next.mode(),
            when = ?next.pause_position(),
            "State transition"
        );
        self.state = next;
        self.dirty = true;
    }

    /// A viewer finished identifying itself.
    ///
    /// `reconnecting` is the position a reconnecting viewer was at; it only
    /// matters when no position has been established yet. Announcing again
    /// under a new name renames without re-joining.
    pub fn join(&mut self, viewer: Viewer, reconnecting: Option<f64>) {
        if self.registry.contains(viewer.id) {
            tracing::debug!(viewer = %viewer, "Viewer renamed");
            let _ = self.registry.rename(viewer.id, viewer.name);
            return;
        }

        match self.state {
            SyncState::Init => {
                let when = reconnecting.unwrap_or(0.0);
                self.transition(SyncState::Paused { when });
                self.dispatch.broadcast(Desired::Pause { when });
            }
            SyncState::Paused { when } => {
                self.dispatch.unicast(viewer.id, Desired::Pause { when });
                self.transition(SyncState::WaitingForReady { when });
            }
            SyncState::WaitingForReady { when } => {
                self.dispatch.unicast(viewer.id, Desired::Pause { when });
            }
            SyncState::WaitingForWhenReports(_) => {
                // True position isn't known until the reports are in
                self.dispatch.unicast(viewer.id, Desired::Pause { when: 0.0 });
            }
            SyncState::Playing { from } => {
                self.pause_and_report_when(from);
            }
        }

        let name = viewer.name.clone();
        if let Err(e) = self.registry.register(viewer) {
            tracing::warn!(error = %e, "Join for registered viewer");
        }

        let count = self.registry.count();
        tracing::info!(name = %name, viewers = count, "Viewer joined");
        self.dispatch.notify(&format!(
            "Welcome to the party, {}! We are up to {} viewers.",
            name, count
        ));
    }

    /// A registered viewer disconnected
    pub fn leave(&mut self, id: ViewerId) -> Option<Viewer> {
        let viewer = self.registry.unregister(id)?;

        if self.registry.is_empty() {
            // Nobody left to hear a broadcast
            let next = match self.state.best_known_position() {
                Some(when) => SyncState::Paused { when },
                None => SyncState::Init,
            };
            self.transition(next);
        } else {
            match self.state {
                SyncState::WaitingForReady { .. } => self.check_all_ready(),
                SyncState::WaitingForWhenReports(ref reports) => {
                    let mut reports = reports.clone();
                    reports.remove(id);
                    self.transition(SyncState::WaitingForWhenReports(reports));
                    self.check_when_reports();
                }
                SyncState::Init | SyncState::Paused { .. } | SyncState::Playing { .. } => {}
            }
        }

        let count = self.registry.count();
        tracing::info!(name = %viewer.name, viewers = count, "Viewer left");
        self.dispatch.notify(&format!(
            "{} left, down to {} viewers.",
            viewer.name, count
        ));

        Some(viewer)
    }

    /// Start playback if everyone is paused at an agreed position
    pub fn play(&mut self) -> PlayOutcome {
        match self.state {
            SyncState::Paused { when } => {
                if self.registry.is_empty() {
                    return PlayOutcome::NotPossible;
                }
                self.transition(SyncState::Playing { from: when });
                self.dispatch.broadcast(Desired::Play);
                PlayOutcome::Started
            }
            SyncState::Playing { .. } => PlayOutcome::AlreadyPlaying,
            SyncState::Init
            | SyncState::WaitingForReady { .. }
            | SyncState::WaitingForWhenReports(_) => PlayOutcome::NotPossible,
        }
    }

    /// Pause at `when`, or, with no position while playing, ask everyone
    /// where they are first
    pub fn pause(&mut self, when: Option<f64>) -> PauseOutcome {
        match when {
            Some(when) => match self.state {
                SyncState::WaitingForWhenReports(_) => PauseOutcome::Ignored,
                SyncState::Init
                | SyncState::Paused { .. }
                | SyncState::WaitingForReady { .. }
                | SyncState::Playing { .. } => {
                    self.pause_at(when);
                    PauseOutcome::PausingAt(when)
                }
            },
            None => match self.state {
                SyncState::Playing { from } => {
                    self.pause_and_report_when(from);
                    PauseOutcome::CollectingPositions
                }
                SyncState::Init
                | SyncState::Paused { .. }
                | SyncState::WaitingForReady { .. }
                | SyncState::WaitingForWhenReports(_) => PauseOutcome::Ignored,
            },
        }
    }

    /// Move the pause position back by `seconds`
    pub fn rewind(&mut self, seconds: f64) -> Result<f64, SyncError> {
        match self.state {
            SyncState::Paused { when } | SyncState::WaitingForReady { when } => {
                let new_when = when - seconds;
                self.pause_at(new_when);
                Ok(new_when)
            }
            SyncState::Init | SyncState::WaitingForWhenReports(_) | SyncState::Playing { .. } => {
                Err(SyncError::CannotRewind {
                    mode: self.state.mode(),
                })
            }
        }
    }

    /// A viewer has seeked to `when` and can play from there
    pub fn report_ready(&mut self, id: ViewerId, when: f64) {
        if let Err(e) = self.registry.set_readiness(id, when) {
            tracing::debug!(error = %e, when = when, "Readiness from unregistered viewer");
            return;
        }

        match self.state {
            SyncState::Paused { when: target } => {
                if !self.config.agrees(when, target) {
                    tracing::debug!(viewer = %id, when = when, target = target, "Viewer drifted");
                    self.transition(SyncState::WaitingForReady { when: target });
                }
            }
            SyncState::WaitingForReady { .. } => self.check_all_ready(),
            SyncState::Init | SyncState::WaitingForWhenReports(_) | SyncState::Playing { .. } => {}
        }
    }

    /// A viewer answered a `pauseAndReportWhen`
    pub fn report_when(&mut self, id: ViewerId, when: f64) {
        let SyncState::WaitingForWhenReports(ref reports) = self.state else {
            return;
        };
        let Some(entry) = self.registry.get(id) else {
            tracing::debug!(viewer = %id, "Position report from unregistered viewer");
            return;
        };

        let mut reports = reports.clone();
        reports.record(entry.viewer.clone(), when);
        self.transition(SyncState::WaitingForWhenReports(reports));
        self.check_when_reports();
    }

    /// Free-text notification to every registered viewer
    pub fn notify(&mut self, text: &str) {
        self.dispatch.notify(text);
    }

    /// Force viewers to disconnect
    pub fn kick(&mut self, target: &KickTarget) -> Vec<String> {
        self.dispatch.kick(target)
    }

    fn pause_at(&mut self, when: f64) {
        if self.registry.is_empty() {
            self.transition(SyncState::Paused { when });
            return;
        }
        self.transition(SyncState::WaitingForReady { when });
        self.dispatch.broadcast(Desired::Pause { when });
    }

    fn pause_and_report_when(&mut self, last_reported_when: f64) {
        self.dispatch.broadcast(Desired::PauseAndReportWhen);
        let reports = WhenReports::new(self.registry.all(), last_reported_when);
        self.transition(SyncState::WaitingForWhenReports(reports));
    }

    fn check_all_ready(&mut self) {
        if let SyncState::WaitingForReady { when } = self.state {
            if self.registry.all_ready_at(when, self.config.epsilon) {
                self.transition(SyncState::Paused { when });
            }
        }
    }

    fn check_when_reports(&mut self) {
        let SyncState::WaitingForWhenReports(ref reports) = self.state else {
            return;
        };
        if let Some(consensus) = reports.consensus() {
            self.transition(SyncState::Paused { when: consensus });
            self.dispatch.broadcast(Desired::Pause { when: consensus });
        }
    }
}
