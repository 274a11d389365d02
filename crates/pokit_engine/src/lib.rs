//! # Pokit Engine
//!
//! Runtime core of a 2D entity/component game engine.
//!
//! ## Features
//!
//! - **Transform hierarchy**: entities nest under entities or scenes, with
//!   cached global positions that invalidate lazily
//! - **Subscription-driven systems**: systems iterate the entities holding
//!   their component and only run in scenes where someone does
//! - **Cart templates**: inheritable entity and scene definitions loaded
//!   from JSON
//! - **Collision**: spatial-hash broad phase, directional blocking and
//!   enter/exit events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pokit_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default());
//!     pokit_engine::physics::install(&mut engine);
//!     engine.awake()?;
//!     engine.load_cart_json(
//!         r#"{"name": "demo", "defaultScene": "main",
//!             "entities": {"Ball": {"components": {"rigidBody": {"vector": {"x": 2.0}}}}},
//!             "scenes": {"main": {"entities": {"Ball": [{"position": {"x": 10.0}}]}}}}"#,
//!     )?;
//!
//!     while engine.is_running() {
//!         engine.frame()?;
//!         if engine.steps_total() >= 300 {
//!             engine.quit();
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod physics;
pub mod spatial;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, EngineConfig, PhysicsConfig},
        ecs::{
            events, CartManifest, Component, EcsError, Entity, IdentityProps, ParentLink, System, Target,
            World, IDENTITY,
        },
        events::{phases, EventBus, EventPayload},
        foundation::{
            collections::{EntityId, SceneId},
            math::{Aabb, Vector},
            time::{FixedTimestep, Timer},
        },
        Engine, EngineError,
    };
}
