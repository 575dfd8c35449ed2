//! The coordinator task

use tokio::sync::{mpsc, watch};

use super::event::{Event, Origin};
use super::handle::CoordinatorHandle;
use crate::command::{execute, CommandTable};
use crate::dispatch::ViewerHub;
use crate::sync::{SyncConfig, SyncMachine, SyncSnapshot};
use crate::viewer::Viewer;

/// Owner of the one synchronization state machine
pub struct Coordinator {
    machine: SyncMachine<ViewerHub>,
    console: CommandTable,
    remote: CommandTable,
    events: mpsc::Receiver<Event>,
    state: watch::Sender<SyncSnapshot>,
}

impl Coordinator {
    /// Create a coordinator and the handle used to reach it
    pub fn new(hub: ViewerHub, sync: SyncConfig, capacity: usize) -> (Self, CoordinatorHandle) {
        let (events_tx, events) = mpsc::channel(capacity.max(1));
        let machine = SyncMachine::new(hub, sync);
        let (state, state_rx) = watch::channel(machine.snapshot());

        let coordinator = Self {
            machine,
            console: CommandTable::console(),
            remote: CommandTable::remote(),
            events,
            state,
        };
        (coordinator, CoordinatorHandle::new(events_tx, state_rx))
    }

    /// Process events until every handle has been dropped
    pub async fn run(mut self) {
        tracing::debug!("Coordinator started");
        while let Some(event) = self.events.recv().await {
            self.turn(event);
        }
        tracing::debug!("Coordinator stopped");
    }

    /// Apply `first` and everything already queued, then publish once.
    /// Returns whether a snapshot was published.
    fn turn(&mut self, first: Event) -> bool {
        self.apply(first);
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
        }
        self.publish()
    }

    fn publish(&mut self) -> bool {
        if !self.machine.take_dirty() {
            return false;
        }
        let snapshot = self.machine.snapshot();
        tracing::trace!(snapshot = ?snapshot, "Publishing state");
        self.state.send_replace(snapshot);
        true
    }

    fn apply(&mut self, event: Event) {
        tracing::trace!(event = event.kind(), "Event");

        match event {
            Event::Connected { viewer, outbound } => {
                self.machine.dispatch_mut().connect(viewer, outbound);
            }
            Event::Announce {
                viewer,
                name,
                reconnecting,
                reply,
            } => {
                if self.machine.dispatch_mut().set_name(viewer, name.clone()) {
                    self.machine.join(Viewer::new(viewer, name), reconnecting);
                } else {
                    tracing::debug!(viewer = %viewer, "Announce from closed connection");
                }
                let _ = reply.send(());
            }
            Event::Disconnected { viewer } => {
                if self.machine.dispatch_mut().disconnect(viewer).is_some() {
                    self.machine.leave(viewer);
                }
            }
            Event::Play => {
                let outcome = self.machine.play();
                tracing::debug!(outcome = ?outcome, "Play requested");
            }
            Event::Pause { when } => {
                let outcome = self.machine.pause(when);
                tracing::debug!(when = ?when, outcome = ?outcome, "Pause requested");
            }
            Event::Rewind { seconds, reply } => {
                let result = self.machine.rewind(seconds);
                if let Err(ref e) = result {
                    tracing::warn!(seconds = seconds, error = %e, "Rewind rejected");
                }
                let _ = reply.send(result);
            }
            Event::Ready { viewer, when } => self.machine.report_ready(viewer, when),
            Event::ReportWhen { viewer, when } => self.machine.report_when(viewer, when),
            Event::Command {
                line,
                origin,
                reply,
            } => {
                let table = match origin {
                    Origin::Console => &self.console,
                    Origin::Controller => &self.remote,
                };
                tracing::debug!(line = %line, origin = ?origin, "Command");
                let output = execute(table, &mut self.machine, &line);
                let _ = reply.send(output);
            }
        }
    }
}
