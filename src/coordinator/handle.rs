//! Cloneable handle to a running coordinator

use tokio::sync::{mpsc, oneshot, watch};

use super::event::{Event, Origin};
use crate::command::CommandOutput;
use crate::dispatch::Outbound;
use crate::error::{Error, Result};
use crate::sync::SyncSnapshot;
use crate::viewer::ViewerId;

/// Sends events to the coordinator and observes its published state
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    events: mpsc::Sender<Event>,
    state: watch::Receiver<SyncSnapshot>,
}

impl CoordinatorHandle {
    pub(super) fn new(events: mpsc::Sender<Event>, state: watch::Receiver<SyncSnapshot>) -> Self {
        Self { events, state }
    }

    async fn send(&self, event: Event) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| Error::CoordinatorClosed)
    }

    async fn request<T>(&self, event: Event, reply: oneshot::Receiver<T>) -> Result<T> {
        self.send(event).await?;
        reply.await.map_err(|_| Error::CoordinatorClosed)
    }

    /// Register a freshly accepted viewer socket
    pub async fn connect(
        &self,
        viewer: ViewerId,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Result<()> {
        self.send(Event::Connected { viewer, outbound }).await
    }

    /// Name a viewer and join it to the party; returns the server version
    pub async fn announce(
        &self,
        viewer: ViewerId,
        name: String,
        reconnecting: Option<f64>,
    ) -> Result<&'static str> {
        let (reply, rx) = oneshot::channel();
        self.request(
            Event::Announce {
                viewer,
                name,
                reconnecting,
                reply,
            },
            rx,
        )
        .await?;
        Ok(crate::VERSION)
    }

    /// Report that a viewer socket has closed
    pub async fn disconnect(&self, viewer: ViewerId) -> Result<()> {
        self.send(Event::Disconnected { viewer }).await
    }

    /// Request playback
    pub async fn play(&self) -> Result<()> {
        self.send(Event::Play).await
    }

    /// Request a pause, at `when` if given
    pub async fn pause(&self, when: Option<f64>) -> Result<()> {
        self.send(Event::Pause { when }).await
    }

    /// Rewind by `seconds`; returns the new pause position
    pub async fn rewind(&self, seconds: f64) -> Result<f64> {
        let (reply, rx) = oneshot::channel();
        let result = self.request(Event::Rewind { seconds, reply }, rx).await?;
        Ok(result?)
    }

    /// A viewer is ready to play from `when`
    pub async fn ready(&self, viewer: ViewerId, when: f64) -> Result<()> {
        self.send(Event::Ready { viewer, when }).await
    }

    /// A viewer's current position after `pauseAndReportWhen`
    pub async fn report_when(&self, viewer: ViewerId, when: f64) -> Result<()> {
        self.send(Event::ReportWhen { viewer, when }).await
    }

    /// Run a line of operator input
    pub async fn command(&self, line: impl Into<String>, origin: Origin) -> Result<CommandOutput> {
        let (reply, rx) = oneshot::channel();
        self.request(
            Event::Command {
                line: line.into(),
                origin,
                reply,
            },
            rx,
        )
        .await
    }

    /// Receiver of coalesced state snapshots
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.state.clone()
    }

    /// Most recently published snapshot
    pub fn snapshot(&self) -> SyncSnapshot {
        self.state.borrow().clone()
    }
}
