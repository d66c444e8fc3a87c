//! Lifecycle event notification
//!
//! Handles event subscriptions and delivery of loader lifecycle events.

use tokio::sync::mpsc;
use tracing::debug;

use crate::module::resource::ResourceKind;
use crate::module::traits::ModuleState;

/// Event published by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A module changed state
    Transition {
        module: String,
        from: ModuleState,
        to: ModuleState,
    },
    /// A fetch was handed to the resource fetcher
    FetchIssued {
        module: String,
        url: String,
        kind: ResourceKind,
    },
    /// A fetch completed
    FetchSettled { url: String, ok: bool },
    /// A bridge global was invoked
    BridgeInvoked { name: String },
}

/// Event subscription manager
#[derive(Debug, Default)]
pub struct EventManager {
    subscribers: Vec<mpsc::UnboundedSender<LifecycleEvent>>,
}

impl EventManager {
    /// Create a new event manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event published from now on
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<LifecycleEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Publish an event to all subscribers
    ///
    /// Subscribers whose receiver was dropped are removed.
    pub fn publish(&mut self, event: LifecycleEvent) {
        if self.subscribers.is_empty() {
            return;
        }

        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            debug!("Removed {} closed event subscribers", dropped);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_subscribers() {
        let mut events = EventManager::new();
        let mut first = events.subscribe();
        let mut second = events.subscribe();

        events.publish(LifecycleEvent::BridgeInvoked {
            name: "cb_0".to_string(),
        });

        for rx in [&mut first, &mut second] {
            assert_eq!(
                rx.try_recv().unwrap(),
                LifecycleEvent::BridgeInvoked {
                    name: "cb_0".to_string()
                }
            );
        }
    }

    #[test]
    fn test_closed_subscribers_are_dropped() {
        let mut events = EventManager::new();
        let kept = events.subscribe();
        drop(events.subscribe());
        assert_eq!(events.subscriber_count(), 2);

        events.publish(LifecycleEvent::FetchSettled {
            url: "/static/a.js".to_string(),
            ok: true,
        });
        assert_eq!(events.subscriber_count(), 1);
        drop(kept);
    }
}
