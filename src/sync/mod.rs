//! Playback synchronization state machine
//!
//! One shared playback intent for every viewer. The machine consumes viewer
//! and operator events, replaces its [`SyncState`] wholesale on every
//! transition, and pushes desired actions through a
//! [`Dispatch`](crate::dispatch::Dispatch) implementation.
//!
//! # Transitions
//!
//! ```text
//!   Init ──join──► Paused ───────play───────► Playing
//!                   │  ▲                         │
//!        join,      │  │ all ready               │ join, pause()
//!        drift,     ▼  │                         ▼
//!        pause(t) WaitingForReady      WaitingForWhenReports
//!                                                │ all reported
//!                                                ▼
//!                                   Paused { when: min(reports) }
//! ```
//!
//! Barrier states wait indefinitely; there is no timeout-based eviction.

pub mod config;
pub mod error;
pub mod machine;
pub mod snapshot;
pub mod state;

pub use config::SyncConfig;
pub use error::SyncError;
pub use machine::{PauseOutcome, PlayOutcome, SyncMachine};
pub use snapshot::SyncSnapshot;
pub use state::{SyncMode, SyncState, WhenReports};
