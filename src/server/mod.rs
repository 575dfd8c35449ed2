//! WebSocket server
//!
//! Viewers connect to `/viewer`, operators' remote UIs to `/controller`.
//! Both speak the JSON protocol in [`protocol`].

pub mod config;
mod controller;
pub mod listener;
pub mod protocol;
mod socket;
mod viewer;

pub use config::{ServerConfig, TlsPaths};
pub use listener::WatchPartyServer;
