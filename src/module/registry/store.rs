//! Module registry
//!
//! Table of every declared module, in declaration order.

use std::collections::HashMap;
use tracing::debug;

use crate::module::registry::descriptor::{ModuleDescriptor, ModuleId};
use crate::module::resource::ResourceReference;
use crate::module::traits::LoaderError;
use crate::module::validation::is_valid_identifier;

/// Declared modules keyed by identifier
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDescriptor>,
    index: HashMap<String, ModuleId>,
    /// Dependency identifier -> modules naming it, in declaration order
    dependents: HashMap<String, Vec<ModuleId>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a module; fails if the identifier is taken or malformed
    pub fn declare(
        &mut self,
        id: &str,
        dependencies: Vec<String>,
        resources: Vec<ResourceReference>,
    ) -> Result<ModuleId, LoaderError> {
        if !is_valid_identifier(id) {
            return Err(LoaderError::InvalidIdentifier(id.to_string()));
        }
        if self.index.contains_key(id) {
            return Err(LoaderError::DuplicateModule(id.to_string()));
        }
        if let Some(bad) = dependencies.iter().find(|d| !is_valid_identifier(d)) {
            return Err(LoaderError::InvalidIdentifier(bad.clone()));
        }

        let module_id = ModuleId::new(self.modules.len());
        for dependency in &dependencies {
            let named_by = self.dependents.entry(dependency.clone()).or_default();
            if named_by.last() != Some(&module_id) {
                named_by.push(module_id);
            }
        }
        debug!(
            "Declared module {} (dependencies: {:?}, resources: {})",
            id,
            dependencies,
            resources.len()
        );
        self.modules
            .push(ModuleDescriptor::new(id.to_string(), dependencies, resources));
        self.index.insert(id.to_string(), module_id);
        Ok(module_id)
    }

    pub fn lookup(&self, id: &str) -> Result<ModuleId, LoaderError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| LoaderError::ModuleNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Descriptor for an id issued by this registry
    pub fn get(&self, id: ModuleId) -> &ModuleDescriptor {
        &self.modules[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: ModuleId) -> &mut ModuleDescriptor {
        &mut self.modules[id.index()]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Descriptors in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ModuleDescriptor)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId::new(i), m))
    }

    /// Modules listing `id` as a direct dependency, in declaration order
    pub fn dependents_of(&self, id: ModuleId) -> Vec<ModuleId> {
        self.dependents
            .get(self.get(id).id())
            .cloned()
            .unwrap_or_default()
    }
}
