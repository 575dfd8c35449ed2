//! Connection hub
//!
//! Holds the outbound queue of every open viewer connection. Connections are
//! added as soon as the socket is accepted and only become eligible for
//! broadcasts once they have announced a name.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;

use super::{Desired, Dispatch, KickTarget, Outbound};
use crate::viewer::ViewerId;

/// One open viewer connection
#[derive(Debug)]
struct Connection {
    /// Display name, set by `announce`
    name: Option<String>,

    /// Queue drained by the connection's socket task
    outbound: mpsc::UnboundedSender<Outbound>,

    /// Kicked connections receive nothing further
    kicked: bool,
}

impl Connection {
    fn label(&self, id: ViewerId) -> String {
        match self.name {
            Some(ref name) => format!("{} ({})", name, id),
            None => id.to_string(),
        }
    }

    fn send(&self, id: ViewerId, msg: Outbound) {
        // The socket task may already be gone; that race is expected.
        if self.outbound.send(msg).is_err() {
            tracing::trace!(viewer = %id, "Outbound queue closed");
        }
    }
}

/// Registry of open viewer connections implementing [`Dispatch`]
#[derive(Debug)]
pub struct ViewerHub {
    /// Open connections keyed by viewer ID
    connections: HashMap<ViewerId, Connection>,

    /// Delay between `gtfo` and closing a kicked connection
    kick_grace: Duration,
}

impl ViewerHub {
    /// Create an empty hub
    pub fn new(kick_grace: Duration) -> Self {
        Self {
            connections: HashMap::new(),
            kick_grace,
        }
    }

    /// Track a newly accepted connection
    pub fn connect(&mut self, id: ViewerId, outbound: mpsc::UnboundedSender<Outbound>) {
        self.connections.insert(
            id,
            Connection {
                name: None,
                outbound,
                kicked: false,
            },
        );
        tracing::debug!(viewer = %id, connections = self.connections.len(), "Connection added");
    }

    /// Forget a closed connection, returning its name if it had announced one
    pub fn disconnect(&mut self, id: ViewerId) -> Option<String> {
        let conn = self.connections.remove(&id)?;
        tracing::debug!(viewer = %id, connections = self.connections.len(), "Connection removed");
        conn.name
    }

    /// Attach a display name; returns false if the connection is unknown
    pub fn set_name(&mut self, id: ViewerId, name: impl Into<String>) -> bool {
        match self.connections.get_mut(&id) {
            Some(conn) => {
                conn.name = Some(name.into());
                true
            }
            None => false,
        }
    }

    fn named(&self) -> impl Iterator<Item = (&ViewerId, &Connection)> {
        self.connections
            .iter()
            .filter(|(_, conn)| conn.name.is_some() && !conn.kicked)
    }
}

impl Dispatch for ViewerHub {
    fn broadcast(&mut self, desired: Desired) {
        tracing::debug!(desired = ?desired, "Broadcasting");
        for (id, conn) in self.named() {
            conn.send(*id, Outbound::Desired(desired.clone()));
        }
    }

    fn unicast(&mut self, viewer: ViewerId, desired: Desired) {
        let Some(conn) = self.connections.get(&viewer) else {
            return;
        };
        if conn.kicked {
            return;
        }
        tracing::debug!(viewer = %conn.label(viewer), desired = ?desired, "Sending");
        conn.send(viewer, Outbound::Desired(desired));
    }

    fn notify(&mut self, text: &str) {
        for (id, conn) in self.named() {
            conn.send(*id, Outbound::Notification(text.to_string()));
        }
    }

    fn kick(&mut self, target: &KickTarget) -> Vec<String> {
        // None selects every connection
        let wanted: Option<Vec<ViewerId>> = match target {
            KickTarget::Everyone => None,
            KickTarget::Ids(ids) => Some(ids.iter().filter_map(|s| ViewerId::parse(s)).collect()),
        };
        let mut kicked = Vec::new();

        for (id, conn) in self.connections.iter_mut() {
            let selected = wanted.as_ref().map_or(true, |wanted| wanted.contains(id));
            if !selected || conn.kicked {
                continue;
            }

            conn.send(*id, Outbound::Desired(Desired::Gtfo));
            conn.send(
                *id,
                Outbound::Close {
                    after: self.kick_grace,
                },
            );
            conn.kicked = true;

            tracing::info!(viewer = %conn.label(*id), "Viewer kicked");
            kicked.push(conn.label(*id));
        }

        kicked.sort();
        kicked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with(
        n: usize,
    ) -> (
        ViewerHub,
        Vec<(ViewerId, mpsc::UnboundedReceiver<Outbound>)>,
    ) {
        let mut hub = ViewerHub::new(Duration::from_millis(500));
        let mut conns = Vec::new();
        for _ in 0..n {
            let id = ViewerId::new();
            let (tx, rx) = mpsc::unbounded_channel();
            hub.connect(id, tx);
            conns.push((id, rx));
        }
        (hub, conns)
    }

    #[test]
    fn test_broadcast_skips_unregistered() {
        let (mut hub, mut conns) = hub_with(2);
        hub.set_name(conns[0].0, "alice");

        hub.broadcast(Desired::Play);

        assert_eq!(
            conns[0].1.try_recv().unwrap(),
            Outbound::Desired(Desired::Play)
        );
        assert!(conns[1].1.try_recv().is_err());
    }

    #[test]
    fn test_unicast_to_missing_viewer_is_noop() {
        let (mut hub, mut conns) = hub_with(1);

        hub.unicast(ViewerId::new(), Desired::Play);
        hub.unicast(conns[0].0, Desired::Pause { when: 3.0 });

        assert_eq!(
            conns[0].1.try_recv().unwrap(),
            Outbound::Desired(Desired::Pause { when: 3.0 })
        );
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (mut hub, conns) = hub_with(1);
        hub.set_name(conns[0].0, "alice");
        drop(conns);

        // Must not panic or error
        hub.broadcast(Desired::Play);
        hub.notify("hello");
    }

    #[test]
    fn test_notify_named_only() {
        let (mut hub, mut conns) = hub_with(2);
        hub.set_name(conns[1].0, "bob");

        hub.notify("hi there");

        assert!(conns[0].1.try_recv().is_err());
        assert_eq!(
            conns[1].1.try_recv().unwrap(),
            Outbound::Notification("hi there".into())
        );
    }

    #[test]
    fn test_kick_by_id() {
        let (mut hub, mut conns) = hub_with(2);
        hub.set_name(conns[0].0, "alice");
        hub.set_name(conns[1].0, "bob");

        let target = KickTarget::Ids(vec![conns[0].0.to_string(), "nobody".into()]);
        let kicked = hub.kick(&target);

        assert_eq!(kicked, vec![format!("alice ({})", conns[0].0)]);
        assert_eq!(
            conns[0].1.try_recv().unwrap(),
            Outbound::Desired(Desired::Gtfo)
        );
        assert_eq!(
            conns[0].1.try_recv().unwrap(),
            Outbound::Close {
                after: Duration::from_millis(500)
            }
        );
        assert!(conns[1].1.try_recv().is_err());

        // Kicked connections get nothing else, but stay tracked until they close
        hub.broadcast(Desired::Play);
        assert!(conns[0].1.try_recv().is_err());
        assert_eq!(
            conns[1].1.try_recv().unwrap(),
            Outbound::Desired(Desired::Play)
        );
        assert_eq!(hub.disconnect(conns[0].0), Some("alice".into()));
    }

    #[test]
    fn test_kick_matches_parsed_ids() {
        let (mut hub, mut conns) = hub_with(2);

        // Operators may paste the ID in upper case
        let typed = conns[1].0.to_string().to_uppercase();
        let kicked = hub.kick(&KickTarget::Ids(vec![typed, "not-a-uuid".into()]));

        assert_eq!(kicked, vec![conns[1].0.to_string()]);
        assert!(conns[0].1.try_recv().is_err());
        assert_eq!(
            conns[1].1.try_recv().unwrap(),
            Outbound::Desired(Desired::Gtfo)
        );
    }

    #[test]
    fn test_kick_everyone_includes_unnamed() {
        let (mut hub, mut conns) = hub_with(3);
        hub.set_name(conns[0].0, "alice");

        let kicked = hub.kick(&KickTarget::Everyone);
        assert_eq!(kicked.len(), 3);

        for (_, rx) in conns.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), Outbound::Desired(Desired::Gtfo));
        }

        // A second kick doesn't resend
        assert!(hub.kick(&KickTarget::Everyone).is_empty());
    }

    #[test]
    fn test_desired_wire_format() {
        let json = serde_json::to_value(Desired::Pause { when: 4.5 }).unwrap();
        assert_eq!(json, serde_json::json!({ "whatdo": "pause", "when": 4.5 }));

        let json = serde_json::to_value(Desired::PauseAndReportWhen).unwrap();
        assert_eq!(json, serde_json::json!({ "whatdo": "pauseAndReportWhen" }));

        let json = serde_json::to_value(Desired::Gtfo).unwrap();
        assert_eq!(json, serde_json::json!({ "whatdo": "gtfo" }));
    }
}
