//! JSON wire protocol
//!
//! Clients send `{"id": 1, "method": "pause", "params": {"when": 12.5}}`.
//! Requests that carry an `id` get a `result` or `error` frame back with the
//! same `id`; requests without one are fire-and-forget. Everything the server
//! pushes is a [`ServerFrame`] tagged by `type`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::{Desired, Outbound};
use crate::error::{Error, Result};
use crate::sync::SyncSnapshot;

/// One client request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    /// Correlation ID echoed in the response
    #[serde(default)]
    pub id: Option<u64>,
    /// Method name
    pub method: String,
    /// Method parameters (`null` when absent)
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Parse a text frame
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode the parameters as `T`
    pub fn params<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.params.clone())
            .map_err(|e| Error::Protocol(format!("invalid params for {}: {}", self.method, e)))
    }
}

/// `{when}` parameter object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhenParams {
    /// Position in seconds
    pub when: f64,
}

/// Parameters of `announce`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnounceParams {
    /// Display name
    pub name: String,
    /// Position the viewer was at before reconnecting
    #[serde(default)]
    pub reconnecting: Option<WhenParams>,
}

/// Parameters of `rewind`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RewindParams {
    /// How far back to go
    pub seconds: f64,
}

/// Result of `announce`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnounceResult {
    /// Server build version
    pub version: &'static str,
}

/// Frame pushed from server to client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    /// Successful response
    Result { id: u64, result: Value },
    /// Failed response
    Error { id: Option<u64>, message: String },
    /// Desired playback action (viewers)
    Desired { data: Desired },
    /// Free-text notification (viewers)
    Notification { data: String },
    /// State snapshot (controllers)
    State { data: SyncSnapshot },
    /// The server is going away; reconnect later
    Reconnect,
}

impl ServerFrame {
    /// Response frame for a request, or `None` if it carried no `id`
    pub fn reply(id: Option<u64>, result: Result<Value>) -> Option<Self> {
        let id = id?;
        Some(match result {
            Ok(result) => ServerFrame::Result { id, result },
            Err(e) => ServerFrame::Error {
                id: Some(id),
                message: e.to_string(),
            },
        })
    }

    /// Frame for a queued viewer message; `Close` has none
    pub fn from_outbound(msg: Outbound) -> Option<Self> {
        match msg {
            Outbound::Desired(data) => Some(ServerFrame::Desired { data }),
            Outbound::Notification(data) => Some(ServerFrame::Notification { data }),
            Outbound::Close { .. } => None,
        }
    }

    /// Serialize to a text frame
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
