//! Watch party server
//!
//! Keeps a group of remote viewers' video players in lockstep. Viewers
//! connect over WebSockets, announce a name and follow the coordinator's
//! `play`/`pause` instructions; when their reported positions disagree, the
//! coordinator pauses everyone at a consensus position and waits until all
//! of them have seeked there before playback resumes.
//!
//! # Example
//!
//! ```no_run
//! use watch_party::{ServerConfig, WatchPartyServer};
//!
//! #[tokio::main]
//! async fn main() -> watch_party::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let server = WatchPartyServer::new(config);
//!     server.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod command;
pub mod console;
pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod server;
pub mod sync;
pub mod viewer;

pub use coordinator::{Coordinator, CoordinatorHandle, Origin};
pub use error::{Error, Result};
pub use server::{ServerConfig, WatchPartyServer};
pub use sync::{SyncConfig, SyncMachine, SyncSnapshot, SyncState};
pub use viewer::{Viewer, ViewerId};

/// Server build version, reported to viewers on `announce`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
