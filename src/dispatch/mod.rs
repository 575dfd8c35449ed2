//! Broadcast and unicast dispatch
//!
//! The state machine decides *what* every viewer should be doing; a
//! [`Dispatch`] implementation delivers those decisions. Delivery is
//! best-effort: a viewer that disconnected between the decision and the
//! send is silently skipped.

pub mod hub;
#[cfg(test)]
pub(crate) mod recording;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::viewer::ViewerId;

pub use hub::ViewerHub;

/// Desired playback action pushed to viewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "whatdo", rename_all = "camelCase")]
pub enum Desired {
    /// Start playing from the current position
    Play,
    /// Pause and seek to `when` seconds
    Pause { when: f64 },
    /// Pause now and report the current position with `reportWhen`
    PauseAndReportWhen,
    /// You have been kicked; stop and disconnect
    Gtfo,
}

/// Who to kick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KickTarget {
    /// Every connection, named or not
    Everyone,
    /// Connections whose ID parses to one of these
    Ids(Vec<String>),
}

/// Message queued for a single viewer connection
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Desired playback action
    Desired(Desired),
    /// Free-text notification
    Notification(String),
    /// Close the connection after a grace period
    Close { after: Duration },
}

/// Delivery of coordinator decisions to viewers
///
/// All methods are synchronous so that a state transition and the messages
/// it produces happen within the same event-loop turn.
pub trait Dispatch {
    /// Deliver to every registered (named) viewer
    fn broadcast(&mut self, desired: Desired);

    /// Deliver to exactly one viewer; no-op if it is gone
    fn unicast(&mut self, viewer: ViewerId, desired: Desired);

    /// Free-text notification to every registered viewer
    fn notify(&mut self, text: &str);

    /// Send `gtfo` to the targets and close their connections.
    ///
    /// Returns a label for every connection that was kicked.
    fn kick(&mut self, target: &KickTarget) -> Vec<String>;
}
