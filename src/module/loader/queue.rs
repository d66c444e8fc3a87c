//! Loader event queue
//!
//! Everything asynchronous reaches the loader as a `LoaderEvent` on this
//! queue: fetch completions and globals invoked by foreign scripts.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::module::resource::{FetchOutcome, RequestId};

/// Event processed by `Loader::pump` / `Loader::wait_for`
#[derive(Debug)]
pub enum LoaderEvent {
    /// A fetch finished
    FetchSettled {
        request: RequestId,
        result: Result<FetchOutcome, String>,
    },
    /// A foreign script called a bridge global by name
    GlobalInvoked { name: String, args: Vec<Value> },
}

/// Cloneable handle for queueing events into a loader
#[derive(Debug, Clone)]
pub struct LoaderEventSender {
    tx: mpsc::UnboundedSender<LoaderEvent>,
}

impl LoaderEventSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<LoaderEvent>) -> Self {
        Self { tx }
    }

    /// Queue a call of the global `name`; false if the loader is gone
    pub fn invoke_global(&self, name: impl Into<String>, args: Vec<Value>) -> bool {
        self.send(LoaderEvent::GlobalInvoked {
            name: name.into(),
            args,
        })
    }

    pub(crate) fn send(&self, event: LoaderEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

pub(crate) fn channel() -> (LoaderEventSender, mpsc::UnboundedReceiver<LoaderEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LoaderEventSender::new(tx), rx)
}
