//! Event system
//!
//! Two kinds of events flow through the engine:
//! - system events (`init`, `update`, `destroy`, custom handlers such as
//!   `onCollisionEnter`) dispatched by the [`World`] to systems, carrying an
//!   [`EventPayload`];
//! - module phase events (`preUpdate`, `postUpdate`, `render`, ...) dispatched
//!   by the [`EventBus`] to handlers registered by engine modules.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ecs::{EcsError, World};
use crate::physics::Collision;

/// Phase names the engine loop emits
pub mod phases {
    /// Once, after modules are installed
    pub const AWAKE: &str = "awake";
    /// Once, after the cart's templates are loaded
    pub const POST_LOAD: &str = "postLoad";
    /// Start of every simulation step
    pub const INPUT: &str = "input";
    /// Before systems update
    pub const PRE_UPDATE: &str = "preUpdate";
    /// After systems update
    pub const POST_UPDATE: &str = "postUpdate";
    /// Before drawing
    pub const PRE_RENDER: &str = "preRender";
    /// Drawing
    pub const RENDER: &str = "render";
    /// After drawing
    pub const POST_RENDER: &str = "postRender";
}

/// Argument passed along with a system event
#[derive(Debug, Clone, Default)]
pub enum EventPayload {
    /// Lifecycle events carry nothing
    #[default]
    Empty,
    /// Contact record for collision callbacks
    Collision(Rc<Collision>),
    /// Free-form data for script-defined events
    Value(serde_json::Value),
}

impl EventPayload {
    /// Collision record, if this payload carries one
    pub fn collision(&self) -> Option<&Rc<Collision>> {
        if let Self::Collision(collision) = self {
            Some(collision)
        } else {
            None
        }
    }

    /// Structured data, if this payload carries some
    pub fn value(&self) -> Option<&serde_json::Value> {
        if let Self::Value(value) = self {
            Some(value)
        } else {
            None
        }
    }
}

/// Handler invoked for a module phase
pub type PhaseHandler = Box<dyn FnMut(&mut World) -> Result<(), EcsError>>;

/// Named phase dispatch for engine modules
///
/// Handlers run in registration order; every handler registered for a phase
/// sees it.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<String, Vec<PhaseHandler>>,
}

impl EventBus {
    /// Create a bus with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `phase`
    pub fn register_handler(
        &mut self,
        phase: impl Into<String>,
        handler: impl FnMut(&mut World) -> Result<(), EcsError> + 'static,
    ) {
        self.handlers.entry(phase.into()).or_default().push(Box::new(handler));
    }

    /// Run every handler for `phase`, stopping at the first error
    pub fn emit(&mut self, phase: &str, world: &mut World) -> Result<(), EcsError> {
        if let Some(handlers) = self.handlers.get_mut(phase) {
            for handler in handlers.iter_mut() {
                handler(world)?;
            }
        }
        Ok(())
    }

    /// Number of handlers registered for `phase`
    pub fn handler_count(&self, phase: &str) -> usize {
        self.handlers.get(phase).map_or(0, Vec::len)
    }
}
