//! Module Loader - client-side module definition and dependency loading
//!
//! This crate provides a runtime that declares named modules with
//! dependency lists, resolves and fetches each module's backing script and
//! style resources exactly once, tracks asynchronous load completion, and
//! runs ordered continuation callbacks that can be paused and resumed from
//! outside (for third-party scripts that only signal completion by calling
//! a named global function).
//!
//! ## Design Principles
//!
//! 1. **Explicit State**: One finite-state machine per module, no implicit flags
//! 2. **Single Owner**: Registries live inside a `Loader` value, never in globals
//! 3. **Event Driven**: Fetch completions and bridge calls arrive as queued events
//! 4. **Opaque Fetching**: Actual I/O is behind the `ResourceFetcher` trait

pub mod config;
pub mod module;
pub mod utils;

pub use config::{LoaderConfig, LocatorConfig, LoggingConfig};
pub use module::{
    ChainContext, ChainHandle, EntryStatus, FetchCompletion, FetchOutcome, FetchRequest,
    FileSystemFetcher, LifecycleEvent, Loader, LoaderError, LoaderEventSender, ModuleHandle,
    ModuleId, ModuleManifest, ModuleState, ReadySignal, ResourceFetcher, ResourceKind,
    ResourceLocator, ResourceReference,
};

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, LoaderError>;
