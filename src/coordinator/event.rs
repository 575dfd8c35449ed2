//! Events accepted by the coordinator

use tokio::sync::{mpsc, oneshot};

use crate::command::CommandOutput;
use crate::dispatch::Outbound;
use crate::sync::SyncError;
use crate::viewer::ViewerId;

/// Which command table a line is run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Local operator console (may `exit`)
    Console,
    /// Remote controller connection
    Controller,
}

/// A single unit of work for the coordinator
#[derive(Debug)]
pub enum Event {
    /// A viewer socket was accepted
    Connected {
        viewer: ViewerId,
        outbound: mpsc::UnboundedSender<Outbound>,
    },
    /// A viewer identified itself
    Announce {
        viewer: ViewerId,
        name: String,
        reconnecting: Option<f64>,
        reply: oneshot::Sender<()>,
    },
    /// A viewer socket closed
    Disconnected { viewer: ViewerId },
    /// Start playback
    Play,
    /// Pause, optionally at a given position
    Pause { when: Option<f64> },
    /// Move the pause position back
    Rewind {
        seconds: f64,
        reply: oneshot::Sender<Result<f64, SyncError>>,
    },
    /// A viewer is paused and seeked to `when`
    Ready { viewer: ViewerId, when: f64 },
    /// A viewer's answer to `pauseAndReportWhen`
    ReportWhen { viewer: ViewerId, when: f64 },
    /// A line of operator input
    Command {
        line: String,
        origin: Origin,
        reply: oneshot::Sender<CommandOutput>,
    },
}

impl Event {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Connected { .. } => "connected",
            Event::Announce { .. } => "announce",
            Event::Disconnected { .. } => "disconnected",
            Event::Play => "play",
            Event::Pause { .. } => "pause",
            Event::Rewind { .. } => "rewind",
            Event::Ready { .. } => "ready",
            Event::ReportWhen { .. } => "reportWhen",
            Event::Command { .. } => "command",
        }
    }
}
