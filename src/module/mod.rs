//! Module system
//!
//! Declares named modules with dependency lists, loads each module's script
//! and style resources exactly once, and runs ordered continuation chains
//! when modules settle.
//!
//! ## Architecture
//!
//! - **Registry**: declared modules in declaration order, plus manifests
//! - **Resolver**: dependency-first load order with cycle detection
//! - **Loader**: per-module state machine driven by queued events
//! - **Chains**: pausable, resumable continuation lists per module
//! - **Bridges**: generated global names foreign scripts can call

pub mod api;
pub mod bridge;
pub mod chain;
pub mod loader;
pub mod registry;
pub mod resource;
pub mod traits;
pub mod validation;

pub use api::{EventManager, LifecycleEvent};
pub use bridge::{BridgeCallback, GlobalBridgeRegistry, GlobalScope};
pub use chain::{ChainContext, ChainHandle, Continuation, ContinuationChain, EntryStatus};
pub use loader::{Loader, LoaderEvent, LoaderEventSender, ModuleHandle};
pub use registry::{
    ManifestDiscovery, ModuleDependencies, ModuleDescriptor, ModuleId, ModuleManifest,
    ModuleRegistry, ReadySignal,
};
pub use resource::{
    FetchCompletion, FetchOutcome, FetchRequest, FileSystemFetcher, RequestId, ResourceKind,
    ResourceLocator, ResourceReference,
};
pub use traits::{LoaderError, ModuleState, ResourceFetcher};
