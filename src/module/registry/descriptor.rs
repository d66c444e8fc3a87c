//! Module descriptors
//!
//! A descriptor is everything the loader knows about one declared module.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::module::chain::ContinuationChain;
use crate::module::resource::ResourceReference;
use crate::module::traits::{LoaderError, ModuleState};

/// Index of a module in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

impl ModuleId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// What has to happen after a module's resources loaded for it to be ready
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadySignal {
    /// Ready as soon as loaded
    #[default]
    Immediate,
    /// Ready once the named global symbol exists
    Global(String),
    /// Ready once the foreign script invokes a generated global callback
    /// derived from this base name
    Bridge(String),
}

/// Declared module
pub struct ModuleDescriptor {
    pub(crate) id: String,
    pub(crate) dependencies: Vec<String>,
    pub(crate) resources: Vec<ResourceReference>,
    pub(crate) ready_signal: ReadySignal,
    pub(crate) state: ModuleState,
    pub(crate) failure: Option<LoaderError>,
    pub(crate) chain: ContinuationChain,
    /// Resolved URLs of the current load attempt
    pub(crate) resolved: Vec<ResourceReference>,
    /// Fetches this module still waits for
    pub(crate) outstanding: usize,
    pub(crate) bridge_name: Option<String>,
    /// Bridge fired before the resources finished loading
    pub(crate) bridge_signalled: bool,
}

impl ModuleDescriptor {
    pub(crate) fn new(
        id: String,
        dependencies: Vec<String>,
        resources: Vec<ResourceReference>,
    ) -> Self {
        Self {
            id,
            dependencies,
            resources,
            ready_signal: ReadySignal::Immediate,
            state: ModuleState::Declared,
            failure: None,
            chain: ContinuationChain::default(),
            resolved: Vec::new(),
            outstanding: 0,
            bridge_name: None,
            bridge_signalled: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn primary_resource(&self) -> Option<&ResourceReference> {
        self.resources.first()
    }

    pub fn secondary_resources(&self) -> &[ResourceReference] {
        self.resources.get(1..).unwrap_or(&[])
    }

    pub fn resources(&self) -> &[ResourceReference] {
        &self.resources
    }

    /// URLs resolved for the current (or last) load attempt
    pub fn resolved_resources(&self) -> &[ResourceReference] {
        &self.resolved
    }

    pub fn ready_signal(&self) -> &ReadySignal {
        &self.ready_signal
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Why the module failed, while it is `Failed`
    pub fn failure(&self) -> Option<&LoaderError> {
        self.failure.as_ref()
    }

    pub fn chain(&self) -> &ContinuationChain {
        &self.chain
    }

    /// Bridge global generated for this module's current load attempt
    pub fn bridge_name(&self) -> Option<&str> {
        self.bridge_name.as_deref()
    }

    /// Declared or Failed: resources and ready signal may still change
    pub(crate) fn is_editable(&self) -> bool {
        matches!(self.state, ModuleState::Declared | ModuleState::Failed)
    }

    /// Ok when ready, the failure when failed, None otherwise
    pub fn outcome(&self) -> Option<Result<(), LoaderError>> {
        match self.state {
            ModuleState::Ready => Some(Ok(())),
            ModuleState::Failed => Some(Err(self
                .failure
                .clone()
                .unwrap_or_else(|| LoaderError::Io(format!("{} failed", self.id))))),
            _ => None,
        }
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("resources", &self.resources)
            .field("ready_signal", &self.ready_signal)
            .field("state", &self.state)
            .field("failure", &self.failure)
            .field("chain_len", &self.chain.len())
            .finish()
    }
}
