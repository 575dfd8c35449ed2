//! Recording dispatcher for state machine tests

use super::{Desired, Dispatch, KickTarget};
use crate::viewer::ViewerId;

/// Everything a [`RecordingDispatch`] was asked to deliver
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sent {
    Broadcast(Desired),
    Unicast(ViewerId, Desired),
    Notify(String),
    Kick(KickTarget),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingDispatch {
    pub sent: Vec<Sent>,
}

impl RecordingDispatch {
    /// Drain the recorded messages
    pub fn take(&mut self) -> Vec<Sent> {
        std::mem::take(&mut self.sent)
    }

    /// Drain and keep only playback messages (no notifications)
    pub fn take_desired(&mut self) -> Vec<Sent> {
        self.take()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Notify(_)))
            .collect()
    }
}

impl Dispatch for RecordingDispatch {
    fn broadcast(&mut self, desired: Desired) {
        self.sent.push(Sent::Broadcast(desired));
    }

    fn unicast(&mut self, viewer: ViewerId, desired: Desired) {
        self.sent.push(Sent::Unicast(viewer, desired));
    }

    fn notify(&mut self, text: &str) {
        self.sent.push(Sent::Notify(text.to_string()));
    }

    fn kick(&mut self, target: &KickTarget) -> Vec<String> {
        self.sent.push(Sent::Kick(target.clone()));
        match target {
            KickTarget::Everyone => vec!["everyone".into()],
            KickTarget::Ids(ids) => ids.clone(),
        }
    }
}
