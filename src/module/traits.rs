//! Module system traits and interfaces
//!
//! Defines the lifecycle state, the error type shared by every loader
//! component, and the fetcher boundary the loader calls into.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::module::resource::{FetchCompletion, FetchRequest, ResourceKind};

/// Module lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleState {
    /// Declared but never requested
    Declared,
    /// Waiting for every dependency to become ready
    DependenciesLoading,
    /// Own resources are being fetched
    SelfLoading,
    /// Own resources fetched, waiting for the ready signal
    Loaded,
    /// Terminal success
    Ready,
    /// Terminal failure (see `ModuleDescriptor::failure`)
    Failed,
}

impl ModuleState {
    /// Ready or Failed
    pub fn is_terminal(self) -> bool {
        matches!(self, ModuleState::Ready | ModuleState::Failed)
    }

    /// Whether the state machine permits `self -> next`
    pub fn can_transition_to(self, next: ModuleState) -> bool {
        use ModuleState::*;
        match (self, next) {
            (Declared, DependenciesLoading)
            | (DependenciesLoading, SelfLoading)
            | (SelfLoading, Loaded)
            | (Loaded, Ready)
            | (Failed, Declared) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleState::Declared => "declared",
            ModuleState::DependenciesLoading => "dependencies-loading",
            ModuleState::SelfLoading => "self-loading",
            ModuleState::Loaded => "loaded",
            ModuleState::Ready => "ready",
            ModuleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Resource fetcher
///
/// Issues the actual fetch of a script or style resource. Implementations
/// must never call back into the loader directly: the outcome is reported
/// through the `FetchCompletion`, which queues an event the loader
/// processes on its next `pump`/`wait_for`.
pub trait ResourceFetcher {
    /// Start fetching `request.url`
    fn fetch(&mut self, request: FetchRequest, completion: FetchCompletion);
}

/// Loader errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("Module already declared: {0}")]
    DuplicateModule(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Module {module} depends on undeclared module {dependency}")]
    UnknownDependency { module: String, dependency: String },

    #[error("Cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Failed to load {kind} {url}: {reason}")]
    ResourceLoad {
        url: String,
        kind: ResourceKind,
        reason: String,
    },

    #[error("Module {module} failed because dependency {dependency} failed")]
    DependencyFailed { module: String, dependency: String },

    #[error("Module {module} loaded but global symbol {symbol} is missing")]
    MissingGlobalSymbol { module: String, symbol: String },

    #[error("Invalid module identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid resource token: {0}")]
    InvalidResource(String),

    #[error("Invalid global name: {0}")]
    InvalidGlobalName(String),

    #[error("Unknown global: {0}")]
    UnknownGlobal(String),

    #[error("Global {0} has no callback installed")]
    BridgeNotInstalled(String),

    #[error("Module {0} is already loading or loaded")]
    AlreadyLoading(String),

    #[error("Invalid module manifest: {0}")]
    InvalidManifest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Timeout waiting for module {0}")]
    Timeout(String),
}

impl From<std::io::Error> for LoaderError {
    fn from(e: std::io::Error) -> Self {
        LoaderError::Io(e.to_string())
    }
}

impl From<toml::de::Error> for LoaderError {
    fn from(e: toml::de::Error) -> Self {
        LoaderError::InvalidManifest(e.to_string())
    }
}
