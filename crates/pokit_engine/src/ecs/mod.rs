//! Entity-Component-System implementation
//!
//! Entities are transform nodes with named, structured component data.
//! Scenes own entities and keep a per-component subscription index that
//! decides which systems run and on which entities. The [`World`] holds every
//! scene, the system catalog, component defaults and cart templates.

pub mod component;
pub mod entity;
pub mod error;
pub mod scene;
pub mod scene_manager;
pub mod system;
pub mod template;
pub mod transform;
pub mod world;

pub use component::{Component, IDENTITY};
pub use entity::{Entity, IdentityProps, ParentLink};
pub use error::EcsError;
pub use scene::{Scene, DEFAULT_SCENE, PERSISTENT_SCENE};
pub use system::{events, System, SystemFn, Target};
pub use template::{CartManifest, EntityStub, SceneStub};
pub use transform::GlobalTransform;
pub use world::World;
