//! Global bridge registry
//!
//! Some third-party scripts can only signal completion by calling a global
//! function by name. The bridge registry hands out collision-free global
//! names and maps each to a callback; foreign code reaches the callback by
//! name only, through `LoaderEventSender::invoke_global`.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::module::loader::Loader;
use crate::module::registry::ModuleId;
use crate::module::traits::LoaderError;
use crate::module::validation::is_valid_global_name;

/// Callback installed at a bridge name
pub type BridgeCallback = Box<dyn FnMut(&mut Loader, &[Value])>;

/// Names defined in the (simulated) global scope
#[derive(Debug, Default, Clone)]
pub struct GlobalScope {
    symbols: HashSet<String>,
}

impl GlobalScope {
    pub fn define(&mut self, symbol: impl Into<String>) -> bool {
        self.symbols.insert(symbol.into())
    }

    pub fn is_defined(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

struct GlobalBridgeEntry {
    owner: Option<ModuleId>,
    callback: Option<BridgeCallback>,
    invocations: u64,
    retired: bool,
}

/// Generated global name -> callback slot
#[derive(Default)]
pub struct GlobalBridgeRegistry {
    entries: HashMap<String, GlobalBridgeEntry>,
    next_suffix: u64,
}

impl GlobalBridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate `<base>_<n>` unused in `scope` and by any earlier bridge
    ///
    /// The name is reserved in `scope` and its slot starts empty.
    pub fn register(
        &mut self,
        base_name: &str,
        owner: Option<ModuleId>,
        scope: &mut GlobalScope,
    ) -> Result<String, LoaderError> {
        if !is_valid_global_name(base_name) {
            return Err(LoaderError::InvalidGlobalName(base_name.to_string()));
        }

        let name = loop {
            let candidate = format!("{}_{}", base_name, self.next_suffix);
            self.next_suffix += 1;
            if !scope.is_defined(&candidate) && !self.entries.contains_key(&candidate) {
                break candidate;
            }
        };

        scope.define(name.clone());
        self.entries.insert(
            name.clone(),
            GlobalBridgeEntry {
                owner,
                callback: None,
                invocations: 0,
                retired: false,
            },
        );
        debug!("Registered bridge global {}", name);
        Ok(name)
    }

    /// Install (or replace) the callback at `name`
    pub fn set(&mut self, name: &str, callback: BridgeCallback) -> Result<(), LoaderError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| LoaderError::UnknownGlobal(name.to_string()))?;
        entry.callback = Some(callback);
        entry.retired = false;
        Ok(())
    }

    /// Remove the callback but keep the name reserved forever
    pub fn retire(&mut self, name: &str) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.callback = None;
            entry.owner = None;
            entry.retired = true;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .map_or(false, |e| e.callback.is_some())
    }

    pub fn owner(&self, name: &str) -> Option<ModuleId> {
        self.entries.get(name).and_then(|e| e.owner)
    }

    pub fn invocations(&self, name: &str) -> u64 {
        self.entries.get(name).map_or(0, |e| e.invocations)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the callback out for the duration of a call
    pub(crate) fn take(&mut self, name: &str) -> Result<BridgeCallback, LoaderError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| LoaderError::UnknownGlobal(name.to_string()))?;
        let callback = entry
            .callback
            .take()
            .ok_or_else(|| LoaderError::BridgeNotInstalled(name.to_string()))?;
        entry.invocations += 1;
        Ok(callback)
    }

    /// Put a taken callback back unless the slot was refilled or retired meanwhile
    pub(crate) fn restore(&mut self, name: &str, callback: BridgeCallback) {
        if let Some(entry) = self.entries.get_mut(name) {
            if entry.callback.is_none() && !entry.retired {
                entry.callback = Some(callback);
            }
        }
    }
}
