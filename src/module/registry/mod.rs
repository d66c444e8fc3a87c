//! Module registry and discovery
//!
//! Handles module declaration, manifest parsing and discovery, and
//! dependency resolution.

pub mod dependencies;
pub mod descriptor;
pub mod discovery;
pub mod manifest;
pub mod store;

pub use dependencies::{DependencyResolution, ModuleDependencies};
pub use descriptor::{ModuleDescriptor, ModuleId, ReadySignal};
pub use discovery::{DiscoveredManifest, ManifestDiscovery};
pub use manifest::{ManifestModule, ModuleManifest};
pub use store::ModuleRegistry;
