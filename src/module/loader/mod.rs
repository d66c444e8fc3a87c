//! Module loading system
//!
//! Handles the module lifecycle, the event queue and the declaration handle.

pub mod handle;
pub mod loader;
pub mod queue;

pub use handle::ModuleHandle;
pub use loader::{Loader, CALLBACK_PLACEHOLDER};
pub use queue::{LoaderEvent, LoaderEventSender};
