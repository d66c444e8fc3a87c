//! Observation API for loader consumers

pub mod events;

pub use events::{EventManager, LifecycleEvent};
