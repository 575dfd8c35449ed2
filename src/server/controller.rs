//! `/controller` sessions

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket};
use futures::StreamExt;
use serde_json::Value;

use super::protocol::{Request, RewindParams, ServerFrame, WhenParams};
use super::socket::{send_frame, send_reconnect_and_close, shutdown_requested, SessionShared};
use crate::coordinator::{CoordinatorHandle, Origin};
use crate::error::{Error, Result};

/// Drive one controller connection until it closes
pub(super) async fn run(socket: WebSocket, peer: SocketAddr, shared: SessionShared) {
    let SessionShared {
        coordinator,
        mut shutdown,
        alive: _alive,
    } = shared;

    tracing::debug!(peer = %peer, "Controller connected");

    let (mut sink, mut stream) = socket.split();
    let mut state = coordinator.subscribe();

    let initial = state.borrow_and_update().clone();
    if !send_frame(&mut sink, &ServerFrame::State { data: initial }).await {
        return;
    }

    loop {
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => {
                send_reconnect_and_close(&mut sink).await;
                break;
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let data = state.borrow_and_update().clone();
                if !send_frame(&mut sink, &ServerFrame::State { data }).await {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(frame) = handle_text(&coordinator, &text).await {
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

    tracing::debug!(peer = %peer, "Controller disconnected");
}

/// Handle one text frame, returning the response to send (if any)
pub(super) async fn handle_text(coordinator: &CoordinatorHandle, text: &str) -> Option<ServerFrame> {
    let request = match Request::parse(text) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed controller request");
            return Some(ServerFrame::Error {
                id: None,
                message: e.to_string(),
            });
        }
    };

    tracing::debug!(method = %request.method, "Controller request");
    let result = handle_request(coordinator, &request).await;
    ServerFrame::reply(request.id, result)
}

async fn handle_request(coordinator: &CoordinatorHandle, request: &Request) -> Result<Value> {
    match request.method.as_str() {
        "play" => {
            coordinator.play().await?;
            Ok(Value::Null)
        }
        "pause" => {
            let params: Option<WhenParams> = request.params()?;
            coordinator.pause(params.map(|p| p.when)).await?;
            Ok(Value::Null)
        }
        "rewind" => {
            let params: RewindParams = request.params()?;
            coordinator.rewind(params.seconds).await?;
            Ok(Value::Null)
        }
        "cliCommand" => {
            let line: String = request.params()?;
            let output = coordinator.command(line, Origin::Controller).await?;
            Ok(output.text.map(Value::String).unwrap_or(Value::Null))
        }
        other => Err(Error::Protocol(format!("unknown method {}", other))),
    }
}
