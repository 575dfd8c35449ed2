//! `/viewer` sessions

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;

use super::protocol::{AnnounceParams, AnnounceResult, Request, ServerFrame, WhenParams};
use super::socket::{send_frame, send_reconnect_and_close, shutdown_requested, SessionShared};
use crate::coordinator::CoordinatorHandle;
use crate::dispatch::Outbound;
use crate::error::{Error, Result};
use crate::viewer::ViewerId;

/// Drive one viewer connection until it closes
pub(super) async fn run(socket: WebSocket, peer: SocketAddr, shared: SessionShared) {
    let SessionShared {
        coordinator,
        mut shutdown,
        alive: _alive,
    } = shared;

    let id = ViewerId::new();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    if coordinator.connect(id, outbound_tx).await.is_err() {
        return;
    }
    tracing::debug!(viewer = %id, peer = %peer, "Viewer connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => {
                send_reconnect_and_close(&mut sink).await;
                break;
            }
            msg = outbound_rx.recv() => match msg {
                Some(Outbound::Close { after }) => {
                    tokio::time::sleep(after).await;
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                Some(msg) => {
                    let Some(frame) = ServerFrame::from_outbound(msg) else {
                        continue;
                    };
                    if !send_frame(&mut sink, &frame).await {
                        break;
                    }
                }
                None => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(frame) = handle_text(&coordinator, id, &text).await {
                        if !send_frame(&mut sink, &frame).await {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::debug!(viewer = %id, peer = %peer, "Viewer disconnected");
    let _ = coordinator.disconnect(id).await;
}

/// Handle one text frame, returning the response to send (if any)
pub(super) async fn handle_text(
    coordinator: &CoordinatorHandle,
    id: ViewerId,
    text: &str,
) -> Option<ServerFrame> {
    let request = match Request::parse(text) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(viewer = %id, error = %e, "Malformed request");
            return Some(ServerFrame::Error {
                id: None,
                message: e.to_string(),
            });
        }
    };

    tracing::debug!(viewer = %id, method = %request.method, "Viewer request");
    let result = handle_request(coordinator, id, &request).await;
    ServerFrame::reply(request.id, result)
}

async fn handle_request(
    coordinator: &CoordinatorHandle,
    id: ViewerId,
    request: &Request,
) -> Result<Value> {
    match request.method.as_str() {
        "announce" => {
            let params: AnnounceParams = request.params()?;
            let version = coordinator
                .announce(id, params.name, params.reconnecting.map(|r| r.when))
                .await?;
            Ok(serde_json::to_value(AnnounceResult { version })?)
        }
        "play" => {
            coordinator.play().await?;
            Ok(Value::Null)
        }
        "pause" => {
            let params: WhenParams = request.params()?;
            coordinator.pause(Some(params.when)).await?;
            Ok(Value::Null)
        }
        "ready" => {
            let params: WhenParams = request.params()?;
            coordinator.ready(id, params.when).await?;
            Ok(Value::Null)
        }
        "reportWhen" => {
            let params: WhenParams = request.params()?;
            coordinator.report_when(id, params.when).await?;
            Ok(Value::Null)
        }
        other => Err(Error::Protocol(format!("unknown method {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::coordinator::Coordinator;
    use crate::dispatch::{Desired, ViewerHub};
    use crate::sync::{SyncConfig, SyncSnapshot};

    fn start() -> CoordinatorHandle {
        let (coordinator, handle) = Coordinator::new(
            ViewerHub::new(Duration::from_millis(10)),
            SyncConfig::default(),
            16,
        );
        tokio::spawn(coordinator.run());
        handle
    }

    fn to_json(frame: Option<ServerFrame>) -> Value {
        serde_json::to_value(frame.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_announce_returns_version() {
        let handle = start();
        let id = ViewerId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        handle.connect(id, tx).await.unwrap();

        let frame = handle_text(
            &handle,
            id,
            r#"{"id":1,"method":"announce","params":{"name":"alice","reconnecting":{"when":30}}}"#,
        )
        .await;
        assert_eq!(
            to_json(frame),
            json!({"type": "result", "id": 1, "result": {"version": crate::VERSION}})
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            Outbound::Desired(Desired::Pause { when: 30.0 })
        );
    }

    #[tokio::test]
    async fn test_ready_and_play() {
        let handle = start();
        let id = ViewerId::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        handle.connect(id, tx).await.unwrap();

        handle_text(&handle, id, r#"{"method":"announce","params":{"name":"a"}}"#).await;
        handle_text(&handle, id, r#"{"method":"pause","params":{"when":4}}"#).await;
        handle_text(&handle, id, r#"{"method":"ready","params":{"when":4.05}}"#).await;
        let frame = handle_text(&handle, id, r#"{"id":9,"method":"play"}"#).await;
        assert_eq!(
            to_json(frame),
            json!({"type": "result", "id": 9, "result": null})
        );

        let mut state = handle.subscribe();
        state
            .wait_for(|s| *s == SyncSnapshot::Playing)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_errors() {
        let handle = start();
        let id = ViewerId::new();

        let frame = handle_text(&handle, id, "{").await;
        assert_eq!(to_json(frame)["id"], Value::Null);

        let frame = handle_text(&handle, id, r#"{"id":2,"method":"dance"}"#).await;
        assert_eq!(
            to_json(frame),
            json!({"type": "error", "id": 2, "message": "Protocol error: unknown method dance"})
        );

        let frame = handle_text(&handle, id, r#"{"id":3,"method":"ready"}"#).await;
        assert_eq!(to_json(frame)["type"], "error");

        // No id, no response
        assert_eq!(handle_text(&handle, id, r#"{"method":"dance"}"#).await, None);
    }
}
