//! Declaration handle
//!
//! Returned by `Loader::declare`; chains continuation and resource calls
//! onto one module.

use crate::module::chain::{ChainContext, ChainHandle};
use crate::module::loader::Loader;
use crate::module::registry::{ModuleDescriptor, ModuleId, ReadySignal};
use crate::module::resource::ResourceReference;
use crate::module::traits::{LoaderError, ModuleState};

/// Borrowed handle to one declared module
pub struct ModuleHandle<'a> {
    loader: &'a mut Loader,
    id: ModuleId,
}

impl<'a> ModuleHandle<'a> {
    pub(crate) fn new(loader: &'a mut Loader, id: ModuleId) -> Self {
        Self { loader, id }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.loader.descriptor(self.id).id()
    }

    pub fn state(&self) -> ModuleState {
        self.loader.state(self.id)
    }

    pub fn descriptor(&self) -> &ModuleDescriptor {
        self.loader.descriptor(self.id)
    }

    /// Run `callback` once the module settles, on either outcome
    pub fn then<F>(self, callback: F) -> Self
    where
        F: FnOnce(&mut ChainContext<'_>) + 'static,
    {
        self.loader.attach(self.id, callback);
        self
    }

    /// Run `callback` only once the module is ready
    pub fn ready<F>(self, callback: F) -> Self
    where
        F: FnOnce(&mut ChainContext<'_>) + 'static,
    {
        self.loader.attach_ready(self.id, callback);
        self
    }

    /// Like `then`, returning the entry's handle
    pub fn attach<F>(&mut self, callback: F) -> ChainHandle
    where
        F: FnOnce(&mut ChainContext<'_>) + 'static,
    {
        self.loader.attach(self.id, callback)
    }

    /// Like `ready`, returning the entry's handle
    pub fn attach_ready<F>(&mut self, callback: F) -> ChainHandle
    where
        F: FnOnce(&mut ChainContext<'_>) + 'static,
    {
        self.loader.attach_ready(self.id, callback)
    }

    /// Add a secondary resource
    pub fn require(self, resource: impl Into<ResourceReference>) -> Result<Self, LoaderError> {
        self.loader.require(self.id, resource)?;
        Ok(self)
    }

    pub fn ready_signal(self, signal: ReadySignal) -> Result<Self, LoaderError> {
        self.loader.set_ready_signal(self.id, signal)?;
        Ok(self)
    }

    pub fn load(self) -> ModuleState {
        self.loader.load(self.id)
    }

    pub fn loader(&mut self) -> &mut Loader {
        &mut *self.loader
    }
}
