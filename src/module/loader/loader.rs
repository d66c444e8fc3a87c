//! Module loader
//!
//! Owns the registry, the resource cache and the global bridge registry, and
//! drives every module through its lifecycle:
//!
//! `Declared -> DependenciesLoading -> SelfLoading -> Loaded -> Ready`
//!
//! with `Failed` reachable from any non-terminal state. The loader is a
//! single-owner value; fetch completions and bridge invocations reach it as
//! events on its queue and are applied by `pump` or `wait_for`. Chains of
//! modules that settled during an operation drain once that operation has
//! applied all of its transitions.

use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::module::api::{EventManager, LifecycleEvent};
use crate::module::bridge::{GlobalBridgeRegistry, GlobalScope};
use crate::module::chain::{ChainContext, ChainHandle, Continuation, EntryStatus, Trigger};
use crate::module::loader::handle::ModuleHandle;
use crate::module::loader::queue::{self, LoaderEvent, LoaderEventSender};
use crate::module::registry::{
    ModuleDependencies, ModuleDescriptor, ModuleId, ModuleManifest, ModuleRegistry, ReadySignal,
};
use crate::module::resource::{
    Acquire, FetchCompletion, FetchOutcome, FetchRequest, RequestId, ResourceCache,
    ResourceLocator, ResourceReference,
};
use crate::module::traits::{LoaderError, ModuleState, ResourceFetcher};
use crate::module::validation::{is_valid_global_name, ManifestValidator, ValidationResult};
use crate::utils::timeout::with_timeout_opt;

/// Placeholder in resource URLs replaced by a module's bridge name
pub const CALLBACK_PLACEHOLDER: &str = "{callback}";

/// Module loader
pub struct Loader {
    registry: ModuleRegistry,
    locator: ResourceLocator,
    fetcher: Box<dyn ResourceFetcher>,
    resources: ResourceCache,
    globals: GlobalScope,
    bridges: GlobalBridgeRegistry,
    events: EventManager,
    queue_tx: LoaderEventSender,
    queue_rx: mpsc::UnboundedReceiver<LoaderEvent>,
    next_request: u64,
    wait_timeout: Option<Duration>,
    /// Modules whose chain must drain once the current operation settles
    pending_drains: VecDeque<ModuleId>,
    flushing: bool,
    /// Modules to re-check in `DependenciesLoading` after a dependency settled
    pending_advances: VecDeque<ModuleId>,
    advancing: bool,
}

impl Loader {
    /// Create a loader resolving tokens with `locator` and fetching through `fetcher`
    pub fn new<F: ResourceFetcher + 'static>(locator: ResourceLocator, fetcher: F) -> Self {
        let (queue_tx, queue_rx) = queue::channel();
        Self {
            registry: ModuleRegistry::new(),
            locator,
            fetcher: Box::new(fetcher),
            resources: ResourceCache::default(),
            globals: GlobalScope::default(),
            bridges: GlobalBridgeRegistry::new(),
            events: EventManager::new(),
            queue_tx,
            queue_rx,
            next_request: 0,
            wait_timeout: None,
            pending_drains: VecDeque::new(),
            flushing: false,
            pending_advances: VecDeque::new(),
            advancing: false,
        }
    }

    /// Create a loader from configuration
    pub fn from_config<F: ResourceFetcher + 'static>(config: &LoaderConfig, fetcher: F) -> Self {
        let mut loader = Self::new(ResourceLocator::from_config(&config.locator), fetcher);
        loader.wait_timeout = config.wait_timeout();
        loader
    }

    /// Bound every `wait_for` by `timeout`
    pub fn set_wait_timeout(&mut self, timeout: Option<Duration>) {
        self.wait_timeout = timeout;
    }

    // ---- declaration -----------------------------------------------------

    /// Declare a module
    ///
    /// Fails with `DuplicateModule` if the identifier is already declared;
    /// the existing descriptor is left untouched.
    pub fn declare<R>(
        &mut self,
        id: &str,
        dependencies: &[&str],
        resources: R,
    ) -> Result<ModuleHandle<'_>, LoaderError>
    where
        R: IntoIterator,
        R::Item: Into<ResourceReference>,
    {
        let module_id = self.registry.declare(
            id,
            dependencies.iter().map(|d| d.to_string()).collect(),
            resources.into_iter().map(Into::into).collect(),
        )?;
        Ok(ModuleHandle::new(self, module_id))
    }

    /// Declare every module of a manifest
    ///
    /// The manifest is validated and checked against existing identifiers
    /// first, so either all of its modules are declared or none.
    pub fn declare_manifest(
        &mut self,
        manifest: &ModuleManifest,
    ) -> Result<Vec<ModuleId>, LoaderError> {
        if let ValidationResult::Invalid(errors) = ManifestValidator::new().validate(manifest) {
            return Err(LoaderError::InvalidManifest(errors.join("; ")));
        }
        if let Some(taken) = manifest
            .modules
            .iter()
            .find(|m| self.registry.contains(&m.id))
        {
            return Err(LoaderError::DuplicateModule(taken.id.clone()));
        }

        let mut declared = Vec::with_capacity(manifest.modules.len());
        for module in &manifest.modules {
            let id = self.registry.declare(
                &module.id,
                module.dependencies.clone(),
                module.resources(),
            )?;
            self.registry.get_mut(id).ready_signal = module.ready.clone();
            declared.push(id);
        }
        Ok(declared)
    }

    /// Handle for a declared module
    pub fn module(&mut self, id: &str) -> Result<ModuleHandle<'_>, LoaderError> {
        let module_id = self.registry.lookup(id)?;
        Ok(ModuleHandle::new(self, module_id))
    }

    pub fn lookup(&self, id: &str) -> Result<ModuleId, LoaderError> {
        self.registry.lookup(id)
    }

    pub fn descriptor(&self, id: ModuleId) -> &ModuleDescriptor {
        self.registry.get(id)
    }

    pub fn state(&self, id: ModuleId) -> ModuleState {
        self.registry.get(id).state()
    }

    /// Ok when ready, the failure when failed, None while still in progress
    pub fn outcome(&self, id: ModuleId) -> Option<Result<(), LoaderError>> {
        self.registry.get(id).outcome()
    }

    /// Load order for `id`: every transitive dependency, then `id`
    pub fn resolve(&self, id: &str) -> Result<Vec<String>, LoaderError> {
        ModuleDependencies::resolve_names(&self.registry, id)
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    /// Add a secondary resource; only while `Declared` or `Failed`
    pub fn require(
        &mut self,
        id: ModuleId,
        resource: impl Into<ResourceReference>,
    ) -> Result<(), LoaderError> {
        let descriptor = self.registry.get_mut(id);
        if !descriptor.is_editable() {
            return Err(LoaderError::AlreadyLoading(descriptor.id.clone()));
        }
        let resource = resource.into();
        debug!("Module {} requires {}", descriptor.id, resource);
        descriptor.resources.push(resource);
        Ok(())
    }

    /// Change what makes the module ready; only while `Declared` or `Failed`
    pub fn set_ready_signal(&mut self, id: ModuleId, signal: ReadySignal) -> Result<(), LoaderError> {
        if let ReadySignal::Global(name) | ReadySignal::Bridge(name) = &signal {
            if !is_valid_global_name(name) {
                return Err(LoaderError::InvalidGlobalName(name.clone()));
            }
        }
        let descriptor = self.registry.get_mut(id);
        if !descriptor.is_editable() {
            return Err(LoaderError::AlreadyLoading(descriptor.id.clone()));
        }
        descriptor.ready_signal = signal;
        Ok(())
    }

    // ---- loading ---------------------------------------------------------

    /// Request a module and, transitively, its dependencies
    ///
    /// Idempotent while the module is loading or ready. A `Failed` module is
    /// retried; its failed dependencies are not. Returns the module's state
    /// once everything this call could do synchronously is done.
    pub fn load(&mut self, id: ModuleId) -> ModuleState {
        match self.state(id) {
            ModuleState::Declared => {}
            ModuleState::Failed => self.reset_for_retry(id),
            state => return state,
        }

        info!("Loading module {}", self.registry.get(id).id);
        self.start_load(id);
        self.flush_drains();
        self.state(id)
    }

    pub fn load_by_name(&mut self, id: &str) -> Result<ModuleState, LoaderError> {
        let module_id = self.registry.lookup(id)?;
        Ok(self.load(module_id))
    }

    fn start_load(&mut self, id: ModuleId) {
        let order = match ModuleDependencies::resolve(&self.registry, id) {
            Ok(order) => order,
            Err(e) => {
                warn!("Cannot load module {}: {}", self.registry.get(id).id, e);
                self.fail(id, e);
                return;
            }
        };

        for &module in &order {
            if self.state(module) == ModuleState::Declared
                && self.transition(module, ModuleState::DependenciesLoading)
            {
                self.pending_advances.push_back(module);
            }
        }
        self.run_advances();
    }

    /// Advance queued modules until no settled dependency is left to react to
    ///
    /// Readiness and failure propagate to dependents through this queue, so
    /// the call depth stays bounded however long a dependency chain is.
    fn run_advances(&mut self) {
        if self.advancing {
            return;
        }
        self.advancing = true;
        while let Some(id) = self.pending_advances.pop_front() {
            self.advance(id);
        }
        self.advancing = false;
    }

    /// Move a module out of `DependenciesLoading` if its dependencies allow it
    fn advance(&mut self, id: ModuleId) {
        if self.state(id) != ModuleState::DependenciesLoading {
            return;
        }

        let dependencies = self.registry.get(id).dependencies.clone();
        let mut all_ready = true;
        for dependency in dependencies {
            let dep_id = match self.registry.lookup(&dependency) {
                Ok(dep_id) => dep_id,
                Err(_) => {
                    let module = self.registry.get(id).id.clone();
                    self.fail(id, LoaderError::UnknownDependency { module, dependency });
                    return;
                }
            };
            match self.state(dep_id) {
                ModuleState::Ready => {}
                ModuleState::Failed => {
                    let module = self.registry.get(id).id.clone();
                    self.fail(id, LoaderError::DependencyFailed { module, dependency });
                    return;
                }
                _ => all_ready = false,
            }
        }

        if all_ready {
            self.begin_self_load(id);
        }
    }

    fn begin_self_load(&mut self, id: ModuleId) {
        if !self.transition(id, ModuleState::SelfLoading) {
            return;
        }

        let bridge_name = match self.registry.get(id).ready_signal.clone() {
            ReadySignal::Bridge(base) => match self.install_module_bridge(id, &base) {
                Ok(name) => Some(name),
                Err(e) => {
                    self.fail(id, e);
                    return;
                }
            },
            _ => None,
        };

        let mut resolved: Vec<ResourceReference> = Vec::new();
        for resource in self.registry.get(id).resources.clone() {
            let reference = match resource.resolve_with(&self.locator) {
                Ok(reference) => reference,
                Err(e) => {
                    self.fail(id, e);
                    return;
                }
            };
            let reference = match bridge_name.as_deref() {
                Some(name) if reference.as_str().contains(CALLBACK_PLACEHOLDER) => {
                    ResourceReference::resolved(
                        reference.as_str().replace(CALLBACK_PLACEHOLDER, name),
                        reference.kind(),
                    )
                }
                _ => reference,
            };
            if !resolved.contains(&reference) {
                resolved.push(reference);
            }
        }

        let mut outstanding = 0;
        let mut to_fetch = Vec::new();
        for reference in &resolved {
            let url = reference.as_str();
            match self.resources.acquire(url, reference.kind(), id) {
                Acquire::Loaded => debug!("{} already loaded", url),
                Acquire::Joined => {
                    debug!("{} already in flight, waiting on it", url);
                    outstanding += 1;
                }
                Acquire::Fetch => {
                    outstanding += 1;
                    to_fetch.push(reference.clone());
                }
            }
        }

        let descriptor = self.registry.get_mut(id);
        descriptor.resolved = resolved;
        descriptor.outstanding = outstanding;

        for reference in to_fetch {
            self.issue_fetch(id, reference);
        }

        if outstanding == 0 {
            self.on_resources_loaded(id);
        }
    }

    /// Generate the bridge global for a module's current load attempt
    fn install_module_bridge(&mut self, id: ModuleId, base: &str) -> Result<String, LoaderError> {
        let name = self.bridges.register(base, Some(id), &mut self.globals)?;
        self.bridges.set(
            &name,
            Box::new(move |loader: &mut Loader, _args: &[Value]| {
                loader.signal_ready(id);
            }),
        )?;

        let descriptor = self.registry.get_mut(id);
        if let Some(previous) = descriptor.bridge_name.replace(name.clone()) {
            self.bridges.retire(&previous);
        }
        self.registry.get_mut(id).bridge_signalled = false;
        debug!("Module {} waits for bridge {}", self.registry.get(id).id, name);
        Ok(name)
    }

    fn issue_fetch(&mut self, id: ModuleId, reference: ResourceReference) {
        self.next_request += 1;
        let request_id = RequestId(self.next_request);
        let url = reference.as_str().to_string();
        let module = self.registry.get(id).id.clone();
        self.resources.register_request(request_id, &url);

        info!("Fetching {} {} for module {}", reference.kind(), url, module);
        self.events.publish(LifecycleEvent::FetchIssued {
            module: module.clone(),
            url: url.clone(),
            kind: reference.kind(),
        });

        let completion = FetchCompletion::new(request_id, url.clone(), self.queue_tx.clone());
        self.fetcher.fetch(
            FetchRequest {
                id: request_id,
                url,
                kind: reference.kind(),
                module,
            },
            completion,
        );
    }

    fn on_fetch_settled(&mut self, request: RequestId, result: Result<FetchOutcome, String>) {
        let (defines, status) = match result {
            Ok(outcome) => (outcome.defines, Ok(())),
            Err(reason) => (Vec::new(), Err(reason)),
        };

        let Some((url, kind, waiters)) = self.resources.settle(request, status.clone()) else {
            warn!("Completion for unknown fetch {}", request);
            return;
        };

        match &status {
            Ok(()) => debug!("Fetched {}", url),
            Err(reason) => warn!("Fetch of {} failed: {}", url, reason),
        }
        self.events.publish(LifecycleEvent::FetchSettled {
            url: url.clone(),
            ok: status.is_ok(),
        });

        for symbol in defines {
            self.globals.define(symbol);
        }

        for waiter in waiters {
            if self.state(waiter) != ModuleState::SelfLoading {
                continue;
            }
            match &status {
                Ok(()) => {
                    let descriptor = self.registry.get_mut(waiter);
                    descriptor.outstanding = descriptor.outstanding.saturating_sub(1);
                    if descriptor.outstanding == 0 {
                        self.on_resources_loaded(waiter);
                    }
                }
                Err(reason) => self.fail(
                    waiter,
                    LoaderError::ResourceLoad {
                        url: url.clone(),
                        kind,
                        reason: reason.clone(),
                    },
                ),
            }
        }
    }

    fn on_resources_loaded(&mut self, id: ModuleId) {
        if !self.transition(id, ModuleState::Loaded) {
            return;
        }

        let descriptor = self.registry.get(id);
        match descriptor.ready_signal.clone() {
            ReadySignal::Immediate => self.mark_ready(id),
            ReadySignal::Global(symbol) => {
                if self.globals.is_defined(&symbol) {
                    self.mark_ready(id);
                } else {
                    let module = descriptor.id.clone();
                    self.fail(id, LoaderError::MissingGlobalSymbol { module, symbol });
                }
            }
            ReadySignal::Bridge(_) => {
                if descriptor.bridge_signalled {
                    self.mark_ready(id);
                } else {
                    debug!(
                        "Module {} loaded, waiting for bridge {:?}",
                        descriptor.id, descriptor.bridge_name
                    );
                }
            }
        }
    }

    /// Report that a module's ready condition happened
    ///
    /// `Loaded` modules become `Ready`; a signal arriving while the module's
    /// resources are still loading is remembered. Returns false when the
    /// module is in no state to accept the signal.
    pub fn signal_ready(&mut self, id: ModuleId) -> bool {
        let accepted = match self.state(id) {
            ModuleState::Loaded => {
                self.mark_ready(id);
                true
            }
            ModuleState::SelfLoading => {
                self.registry.get_mut(id).bridge_signalled = true;
                true
            }
            ModuleState::Ready => true,
            state => {
                debug!(
                    "Ignoring ready signal for module {} in state {}",
                    self.registry.get(id).id,
                    state
                );
                false
            }
        };
        self.flush_drains();
        accepted
    }

    fn mark_ready(&mut self, id: ModuleId) {
        if !self.transition(id, ModuleState::Ready) {
            return;
        }
        self.pending_drains.push_back(id);

        let dependents = self.registry.dependents_of(id);
        self.pending_advances.extend(dependents);
        self.run_advances();
    }

    fn fail(&mut self, id: ModuleId, error: LoaderError) {
        if !self.transition(id, ModuleState::Failed) {
            return;
        }
        warn!("Module {} failed: {}", self.registry.get(id).id, error);

        let descriptor = self.registry.get_mut(id);
        descriptor.failure = Some(error);
        descriptor.outstanding = 0;
        if let Some(name) = descriptor.bridge_name.take() {
            self.bridges.retire(&name);
        }
        self.resources.drop_waiter(id);
        self.pending_drains.push_back(id);

        // dependents still waiting fail with DependencyFailed in `advance`
        let dependents = self.registry.dependents_of(id);
        self.pending_advances.extend(dependents);
        self.run_advances();
    }

    fn reset_for_retry(&mut self, id: ModuleId) {
        if !self.transition(id, ModuleState::Declared) {
            return;
        }
        let descriptor = self.registry.get_mut(id);
        descriptor.failure = None;
        descriptor.resolved.clear();
        descriptor.outstanding = 0;
        descriptor.bridge_signalled = false;
        if let Some(name) = descriptor.bridge_name.take() {
            self.bridges.retire(&name);
        }
        info!("Retrying module {}", self.registry.get(id).id);
    }

    /// Apply a state change and publish it; false if the FSM forbids it
    fn transition(&mut self, id: ModuleId, to: ModuleState) -> bool {
        let descriptor = self.registry.get_mut(id);
        let from = descriptor.state;
        if !from.can_transition_to(to) {
            warn!(
                "Ignoring invalid transition of module {}: {} -> {}",
                descriptor.id, from, to
            );
            return false;
        }
        descriptor.state = to;
        let module = descriptor.id.clone();

        if to.is_terminal() {
            info!("Module {}: {} -> {}", module, from, to);
        } else {
            debug!("Module {}: {} -> {}", module, from, to);
        }
        self.events
            .publish(LifecycleEvent::Transition { module, from, to });
        true
    }

    // ---- continuation chains ---------------------------------------------

    /// Append a callback that runs once the module settles, whatever the outcome
    ///
    /// Runs before returning if the module already settled and its chain is
    /// neither paused nor draining.
    pub fn attach<F>(&mut self, id: ModuleId, callback: F) -> ChainHandle
    where
        F: FnOnce(&mut ChainContext<'_>) + 'static,
    {
        self.push_continuation(id, Box::new(callback), Trigger::Always)
    }

    /// Append a callback that runs only once the module is `Ready`
    ///
    /// Skipped if the module fails.
    pub fn attach_ready<F>(&mut self, id: ModuleId, callback: F) -> ChainHandle
    where
        F: FnOnce(&mut ChainContext<'_>) + 'static,
    {
        self.push_continuation(id, Box::new(callback), Trigger::SuccessOnly)
    }

    fn push_continuation(
        &mut self,
        id: ModuleId,
        callback: Continuation,
        trigger: Trigger,
    ) -> ChainHandle {
        let position = self.registry.get_mut(id).chain.push(callback, trigger);
        if self.state(id).is_terminal() {
            self.drain_chain(id);
        }
        ChainHandle {
            module: id,
            position,
        }
    }

    pub fn entry_status(&self, handle: ChainHandle) -> Option<EntryStatus> {
        self.registry.get(handle.module).chain.status(handle.position)
    }

    /// Clear a paused chain and continue draining from its cursor
    ///
    /// Returns false if the chain was not paused.
    pub fn resume(&mut self, id: ModuleId) -> bool {
        if !self.registry.get_mut(id).chain.unpause() {
            return false;
        }
        debug!("Resuming chain of module {}", self.registry.get(id).id);
        if self.state(id).is_terminal() {
            self.drain_chain(id);
        }
        self.flush_drains();
        true
    }

    pub(crate) fn pause_chain(&mut self, id: ModuleId) {
        debug!("Pausing chain of module {}", self.registry.get(id).id);
        self.registry.get_mut(id).chain.pause();
    }

    /// Run chain entries from the cursor until the end or a pause
    fn drain_chain(&mut self, id: ModuleId) {
        {
            let chain = &mut self.registry.get_mut(id).chain;
            if chain.is_draining() || chain.is_paused() {
                return;
            }
            chain.set_draining(true);
        }

        loop {
            let descriptor = self.registry.get(id);
            let Some(outcome) = descriptor.outcome() else {
                break;
            };
            if descriptor.chain.is_paused() {
                break;
            }
            let Some((position, callback, trigger)) = self.registry.get_mut(id).chain.advance()
            else {
                break;
            };

            if trigger == Trigger::SuccessOnly && outcome.is_err() {
                self.registry
                    .get_mut(id)
                    .chain
                    .mark(position, EntryStatus::Skipped);
                continue;
            }

            let mut ctx = ChainContext::new(self, id, position, outcome);
            callback(&mut ctx);

            let chain = &mut self.registry.get_mut(id).chain;
            if chain.is_paused() {
                chain.mark(position, EntryStatus::Paused);
                debug!("Chain paused after entry {}", position);
                break;
            }
            chain.mark(position, EntryStatus::Ran);
        }

        self.registry.get_mut(id).chain.set_draining(false);
    }

    fn flush_drains(&mut self) {
        if self.flushing {
            return;
        }
        self.flushing = true;
        while let Some(id) = self.pending_drains.pop_front() {
            self.drain_chain(id);
        }
        self.flushing = false;
    }

    // ---- global bridges --------------------------------------------------

    /// Reserve a collision-free global name derived from `base_name`
    pub fn register_global(&mut self, base_name: &str) -> Result<String, LoaderError> {
        let name = self.bridges.register(base_name, None, &mut self.globals)?;
        info!("Registered global {}", name);
        Ok(name)
    }

    /// Install the callback invoked through the global `name`
    pub fn set_global_value<F>(&mut self, name: &str, callback: F) -> Result<(), LoaderError>
    where
        F: FnMut(&mut Loader, &[Value]) + 'static,
    {
        self.bridges.set(name, Box::new(callback))
    }

    /// Call the global `name` as a foreign script would
    pub fn invoke_global(&mut self, name: &str, args: &[Value]) -> Result<(), LoaderError> {
        let mut callback = self.bridges.take(name)?;
        info!("Invoking global {}", name);
        self.events.publish(LifecycleEvent::BridgeInvoked {
            name: name.to_string(),
        });

        callback(self, args);
        self.bridges.restore(name, callback);
        self.flush_drains();
        Ok(())
    }

    /// Define a symbol in the global scope, as a host page script would
    pub fn define_global(&mut self, symbol: impl Into<String>) -> bool {
        self.globals.define(symbol)
    }

    pub fn is_global_defined(&self, symbol: &str) -> bool {
        self.globals.is_defined(symbol)
    }

    pub fn globals(&self) -> &GlobalScope {
        &self.globals
    }

    pub fn bridges(&self) -> &GlobalBridgeRegistry {
        &self.bridges
    }

    // ---- events ----------------------------------------------------------

    /// Sender for queueing fetch completions and global invocations
    pub fn events_sender(&self) -> LoaderEventSender {
        self.queue_tx.clone()
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Fetches issued but not yet completed
    pub fn in_flight(&self) -> usize {
        self.resources.in_flight()
    }

    /// Apply every queued event; returns how many were processed
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.queue_rx.try_recv() {
            self.handle_event(event);
            processed += 1;
        }
        processed
    }

    fn handle_event(&mut self, event: LoaderEvent) {
        match event {
            LoaderEvent::FetchSettled { request, result } => {
                self.on_fetch_settled(request, result);
                self.flush_drains();
            }
            LoaderEvent::GlobalInvoked { name, args } => {
                if let Err(e) = self.invoke_global(&name, &args) {
                    warn!("Global invocation of {} failed: {}", name, e);
                }
            }
        }
    }

    /// Load `id` if needed and process events until it settles
    ///
    /// Bounded by the configured wait timeout, if any; a timeout does not
    /// cancel the load. Without a timeout this waits as long as it takes,
    /// including forever for a bridge that is never invoked.
    pub async fn wait_for(&mut self, id: ModuleId) -> Result<(), LoaderError> {
        if self.state(id) == ModuleState::Declared {
            self.load(id);
        }

        let name = self.registry.get(id).id.clone();
        let timeout = self.wait_timeout;
        match with_timeout_opt(self.settle(id), timeout).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Timed out after {:?} waiting for module {}", timeout, name);
                Err(LoaderError::Timeout(name))
            }
        }
    }

    async fn settle(&mut self, id: ModuleId) -> Result<(), LoaderError> {
        loop {
            self.pump();
            if let Some(outcome) = self.outcome(id) {
                return outcome;
            }
            match self.queue_rx.recv().await {
                Some(event) => self.handle_event(event),
                None => return Err(LoaderError::Io("loader event queue closed".to_string())),
            }
        }
    }
}
