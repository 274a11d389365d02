//! ECS error types

use crate::foundation::collections::{EntityId, SceneId};

/// Wiring and lookup failures raised by the entity registry
#[derive(thiserror::Error, Debug)]
pub enum EcsError {
    /// No scene is registered under this id
    #[error("Unknown scene: {0:?}")]
    UnknownScene(SceneId),

    /// No scene template exists under this name
    #[error("Unknown scene template: {0}")]
    UnknownSceneStub(String),

    /// No entity template exists under this name
    #[error("Unknown entity template: {0}")]
    UnknownStub(String),

    /// No system is registered under this name
    #[error("Unknown system: {0}")]
    UnknownSystem(String),

    /// The entity was destroyed or never existed
    #[error("Unknown entity: {0:?}")]
    UnknownEntity(EntityId),

    /// A named parent could not be found among the loaded entities
    #[error("Entity {entity:?} names parent '{parent}' which does not exist")]
    UnresolvedParent {
        /// Entity whose parent link failed
        entity: EntityId,
        /// Name it asked for
        parent: String,
    },

    /// Linking would make an entity its own ancestor
    #[error("Parent chain of {0:?} forms a cycle")]
    ParentCycle(EntityId),

    /// A template inherits from itself through its ancestors
    #[error("Template '{0}' inherits from itself")]
    InheritanceCycle(String),

    /// Template or component data did not match the expected shape
    #[error("Template error: {0}")]
    Template(#[from] serde_json::Error),

    /// The default and persistent scenes cannot be destroyed
    #[error("Scene '{0}' is built in and cannot be destroyed")]
    BuiltinScene(String),
}
