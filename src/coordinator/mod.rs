//! Coordinator event loop
//!
//! Exactly one [`Coordinator`] task owns the state machine. Transport
//! tasks talk to it through a cloneable [`CoordinatorHandle`], which turns
//! every request into an [`Event`] on a bounded queue. Events are applied one
//! at a time, so no two transitions ever interleave.
//!
//! After each turn (one received event plus everything already queued
//! behind it) the coordinator publishes at most one state snapshot to
//! controllers.

mod event;
mod handle;
mod runner;

pub use event::{Event, Origin};
pub use handle::CoordinatorHandle;
pub use runner::Coordinator;

/// Default capacity of the event queue
pub const DEFAULT_EVENT_CAPACITY: usize = 256;
