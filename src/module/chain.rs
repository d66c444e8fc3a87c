//! Continuation chains
//!
//! Every module owns an ordered, append-only list of callbacks that run once
//! the module settles (`Ready` or `Failed`). Draining walks a cursor through
//! the list one entry at a time. An entry may pause the chain from inside
//! its own execution; draining then stops right after that entry, and a
//! later `Loader::resume` continues from the persisted cursor.

use std::fmt;

use crate::module::loader::Loader;
use crate::module::registry::ModuleId;
use crate::module::traits::LoaderError;

/// Callback attached to a module's chain
pub type Continuation = Box<dyn FnOnce(&mut ChainContext<'_>)>;

/// Execution status of one chain entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Not reached by the cursor yet
    Pending,
    /// Ran to completion
    Ran,
    /// Ran and paused the chain
    Paused,
    /// Success-only entry passed over because the module failed
    Skipped,
}

/// When an entry runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    /// On either outcome (`then`)
    Always,
    /// Only when the module is ready (`ready`)
    SuccessOnly,
}

pub(crate) struct ContinuationEntry {
    callback: Option<Continuation>,
    trigger: Trigger,
    status: EntryStatus,
}

/// Position of an entry in a module's chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHandle {
    pub(crate) module: ModuleId,
    pub(crate) position: usize,
}

impl ChainHandle {
    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

/// Ordered callbacks of one module plus the drain cursor
#[derive(Default)]
pub struct ContinuationChain {
    entries: Vec<ContinuationEntry>,
    cursor: usize,
    paused: bool,
    draining: bool,
}

impl ContinuationChain {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the next entry to run
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Entries the cursor has not reached yet
    pub fn pending(&self) -> usize {
        self.entries.len() - self.cursor
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn status(&self, position: usize) -> Option<EntryStatus> {
        self.entries.get(position).map(|e| e.status)
    }

    pub(crate) fn is_draining(&self) -> bool {
        self.draining
    }

    pub(crate) fn set_draining(&mut self, draining: bool) {
        self.draining = draining;
    }

    pub(crate) fn push(&mut self, callback: Continuation, trigger: Trigger) -> usize {
        self.entries.push(ContinuationEntry {
            callback: Some(callback),
            trigger,
            status: EntryStatus::Pending,
        });
        self.entries.len() - 1
    }

    /// Take the entry under the cursor and advance past it
    pub(crate) fn advance(&mut self) -> Option<(usize, Continuation, Trigger)> {
        let position = self.cursor;
        let entry = self.entries.get_mut(position)?;
        self.cursor += 1;
        let callback = entry.callback.take()?;
        Some((position, callback, entry.trigger))
    }

    pub(crate) fn mark(&mut self, position: usize, status: EntryStatus) {
        if let Some(entry) = self.entries.get_mut(position) {
            entry.status = status;
        }
    }

    pub(crate) fn pause(&mut self) {
        self.paused = true;
    }

    /// Clear the pause flag; true if the chain was paused
    pub(crate) fn unpause(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }
}

impl fmt::Debug for ContinuationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationChain")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("paused", &self.paused)
            .field("draining", &self.draining)
            .finish()
    }
}

/// What a continuation sees while it runs
pub struct ChainContext<'a> {
    loader: &'a mut Loader,
    module: ModuleId,
    position: usize,
    outcome: Result<(), LoaderError>,
}

impl<'a> ChainContext<'a> {
    pub(crate) fn new(
        loader: &'a mut Loader,
        module: ModuleId,
        position: usize,
        outcome: Result<(), LoaderError>,
    ) -> Self {
        Self {
            loader,
            module,
            position,
            outcome,
        }
    }

    pub fn module_id(&self) -> ModuleId {
        self.module
    }

    /// Identifier of the module this chain belongs to
    pub fn module(&self) -> &str {
        self.loader.descriptor(self.module).id()
    }

    /// This entry's handle
    pub fn handle(&self) -> ChainHandle {
        ChainHandle {
            module: self.module,
            position: self.position,
        }
    }

    pub fn outcome(&self) -> Result<(), &LoaderError> {
        self.outcome.as_ref().map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&LoaderError> {
        self.outcome.as_ref().err()
    }

    /// Halt the chain after this entry until `Loader::resume`
    pub fn pause(&mut self) {
        self.loader.pause_chain(self.module);
    }

    /// Loader access for declaring, loading, attaching, bridging, resuming
    pub fn loader(&mut self) -> &mut Loader {
        &mut *self.loader
    }
}
