//! Observability notifications.
//!
//! The world appends a [`WorldEvent`] for every registration and lifecycle
//! change, in call order, and logs it. The host drains the queue with
//! `World::take_events` after each request and forwards the events wherever
//! it likes; delivery is fire-and-forget from the world's perspective.

use serde::{Deserialize, Serialize};
use tracing::info;
use world_types::{Address, ModuleRef};

/// A notification emitted by the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorldEvent {
    /// The world was created.
    WorldSpawned { address: Address, name: String },
    /// A component name was bound (or rebound).
    ComponentRegistered { name: String, module: ModuleRef },
    /// A system name was bound (or rebound).
    SystemRegistered { name: String, module: ModuleRef },
    /// The authorization bootstrap completed.
    Initialized { routes: usize },
    /// The execution target moved to a different executor.
    ExecutorChanged { previous: Address, current: Address },
}

impl WorldEvent {
    /// Short snake_case tag, matching the serialised `kind` field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            WorldEvent::WorldSpawned { .. } => "world_spawned",
            WorldEvent::ComponentRegistered { .. } => "component_registered",
            WorldEvent::SystemRegistered { .. } => "system_registered",
            WorldEvent::Initialized { .. } => "initialized",
            WorldEvent::ExecutorChanged { .. } => "executor_changed",
        }
    }
}

/// Append-only queue of pending notifications.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<WorldEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Log and enqueue an event.
    pub fn push(&mut self, event: WorldEvent) {
        match &event {
            WorldEvent::WorldSpawned { address, name } => {
                info!(%address, %name, "world spawned");
            }
            WorldEvent::ComponentRegistered { name, module } => {
                info!(%name, %module, "component registered");
            }
            WorldEvent::SystemRegistered { name, module } => {
                info!(%name, %module, "system registered");
            }
            WorldEvent::Initialized { routes } => {
                info!(routes, "world initialized");
            }
            WorldEvent::ExecutorChanged { previous, current } => {
                info!(%previous, %current, "executor changed");
            }
        }
        self.events.push(event);
    }

    /// Remove and return every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending events, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[WorldEvent] {
        &self.events
    }
}
