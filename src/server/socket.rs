//! Shared pieces of the WebSocket sessions

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::{mpsc, watch};

use super::protocol::ServerFrame;
use crate::coordinator::CoordinatorHandle;

/// Write half of a client socket
pub(super) type FrameSink = SplitSink<WebSocket, Message>;

/// State cloned into every connection task
#[derive(Debug, Clone)]
pub(super) struct SessionShared {
    /// Coordinator the session forwards requests to
    pub coordinator: CoordinatorHandle,
    /// Flips to `true` when the server is shutting down
    pub shutdown: watch::Receiver<bool>,
    /// Held for the lifetime of the session; the listener waits for every
    /// clone to drop before returning
    pub alive: mpsc::Sender<()>,
}

/// Send one frame; `false` if the socket is gone
pub(super) async fn send_frame(sink: &mut FrameSink, frame: &ServerFrame) -> bool {
    let text = match frame.encode() {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode frame");
            return true;
        }
    };
    sink.send(Message::Text(text)).await.is_ok()
}

/// Tell the client to reconnect later and close the socket
pub(super) async fn send_reconnect_and_close(sink: &mut FrameSink) {
    if send_frame(sink, &ServerFrame::Reconnect).await {
        let _ = sink.send(Message::Close(None)).await;
    }
}

/// Resolves once shutdown has been signalled (or the signal was dropped)
pub(super) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // wait_for checks the current value first
    let _ = shutdown.wait_for(|stop| *stop).await;
}
