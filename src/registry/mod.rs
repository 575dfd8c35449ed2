//! Viewer registry
//!
//! Pure bookkeeping for the set of registered (named) viewers and the last
//! readiness timestamp each one reported. The registry is owned by the state
//! machine and never sends anything on its own.
//!
//! ```text
//!   announce ──► register(viewer)        readiness = None
//!   ready(when) ──► set_readiness(id)    readiness = Some(when)
//!   close ──► unregister(id)             entry dropped
//! ```

pub mod entry;
pub mod error;
pub mod store;

pub use entry::ViewerEntry;
pub use error::RegistryError;
pub use store::ViewerRegistry;
