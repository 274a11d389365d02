//! Systems: behavior dispatched to entities by lifecycle and custom events

use std::collections::HashMap;

use super::{EcsError, World};
use crate::events::EventPayload;
use crate::foundation::collections::EntityId;

/// Lifecycle event names
pub mod events {
    /// Entity or scene became live
    pub const INIT: &str = "init";
    /// Fixed-step simulation update
    pub const UPDATE: &str = "update";
    /// Entity, component or scene is going away
    pub const DESTROY: &str = "destroy";
}

/// Entities a system callback is invoked with
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A single subscriber of the system's default component
    Entity(EntityId),
    /// Every live entity in scope, for systems without a default component
    Batch(&'a [EntityId]),
}

impl Target<'_> {
    /// The targeted entities as a slice
    pub fn entities(&self) -> &[EntityId] {
        match self {
            Self::Entity(id) => std::slice::from_ref(id),
            Self::Batch(ids) => ids,
        }
    }
}

/// Signature shared by every system capability
pub type SystemFn = fn(&mut World, Target<'_>, &EventPayload) -> Result<(), EcsError>;

/// A set of optional event capabilities with scheduling metadata
///
/// A system with a `default_component` runs once per subscriber of that
/// component and is only scheduled in scenes where it has subscribers.
/// Without one it receives every live entity of the scene as one batch.
#[derive(Clone, Default)]
pub struct System {
    /// Higher runs first
    pub priority: i32,
    /// Component whose subscribers this system iterates
    pub default_component: Option<String>,
    /// Called when an entity, component or scene becomes live
    pub init: Option<SystemFn>,
    /// Called every simulation step
    pub update: Option<SystemFn>,
    /// Called when an entity, component or scene is removed
    pub destroy: Option<SystemFn>,
    /// Custom named events such as collision callbacks
    pub handlers: HashMap<String, SystemFn>,
}

impl System {
    /// Create a system with no capabilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set the priority
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder pattern: iterate subscribers of `component`
    #[must_use]
    pub fn with_default_component(mut self, component: impl Into<String>) -> Self {
        self.default_component = Some(component.into());
        self
    }

    /// Builder pattern: set the init capability
    #[must_use]
    pub fn on_init(mut self, callback: SystemFn) -> Self {
        self.init = Some(callback);
        self
    }

    /// Builder pattern: set the update capability
    #[must_use]
    pub fn on_update(mut self, callback: SystemFn) -> Self {
        self.update = Some(callback);
        self
    }

    /// Builder pattern: set the destroy capability
    #[must_use]
    pub fn on_destroy(mut self, callback: SystemFn) -> Self {
        self.destroy = Some(callback);
        self
    }

    /// Builder pattern: handle a custom named event
    #[must_use]
    pub fn on(mut self, event: impl Into<String>, callback: SystemFn) -> Self {
        self.handlers.insert(event.into(), callback);
        self
    }

    /// Callback for `event`, if this system has that capability
    pub fn capability(&self, event: &str) -> Option<SystemFn> {
        match event {
            events::INIT => self.init,
            events::UPDATE => self.update,
            events::DESTROY => self.destroy,
            other => self.handlers.get(other).copied(),
        }
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        handlers.sort_unstable();
        f.debug_struct("System")
            .field("priority", &self.priority)
            .field("default_component", &self.default_component)
            .field("init", &self.init.is_some())
            .field("update", &self.update.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("handlers", &handlers)
            .finish()
    }
}

/// A named entry of the system catalog
#[derive(Debug, Clone)]
pub(crate) struct RegisteredSystem {
    pub name: String,
    pub system: System,
}
