//! Physics module: collision detection, resolution and rigid-body motion
//!
//! Entities opt in through components:
//! - `rigidBody`: moves by velocity and is the agent of collision checks;
//! - `staticCollider`: indexed incrementally, re-indexed only when its
//!   volume changes;
//! - `dynamicCollider`: re-indexed every pass.
//!
//! Colliders carry `blockNorth` / `blockEast` / `blockSouth` / `blockWest`
//! flags choosing which of their faces stop an agent. Contacts are reported
//! to both parties as `onCollisionEnter` / `onCollisionExit` events.

pub mod block_flags;
pub mod collision;
pub mod collision_system;
pub mod rigid_body;


use serde_json::json;

pub use block_flags::{BlockFlags, Side};
pub use collision::{Body, Collision};
pub use collision_system::PhysicsModule;
pub use rigid_body::{PhysicsState, RigidBody};

use crate::engine::Engine;
use crate::events::phases;

/// Velocity-driven collision agent
pub const RIGID_BODY: &str = "rigidBody";
/// Collider that rarely moves
pub const STATIC_COLLIDER: &str = "staticCollider";
/// Collider that moves freely
pub const DYNAMIC_COLLIDER: &str = "dynamicCollider";
/// Position history kept for rigid bodies
pub const PHYSICS_STATE: &str = "physicsState";
/// Fired on both parties when a contact starts
pub const ON_COLLISION_ENTER: &str = "onCollisionEnter";
/// Fired on both parties when a contact ends
pub const ON_COLLISION_EXIT: &str = "onCollisionExit";

/// Install component defaults, systems and the collision pass
pub fn install(engine: &mut Engine) {
    let cell_size = engine.config().physics.cell_size;
    let world = &mut engine.world;

    let collider = json!({
        "blockNorth": false,
        "blockEast": false,
        "blockSouth": false,
        "blockWest": false,
    });
    world.register_component(
        RIGID_BODY,
        json!({
            "vector": {"x": 0.0, "y": 0.0},
            "impulse": {"x": 0.0, "y": 0.0},
            "gravity": 0.0,
            "friction": {"x": 0.0, "y": 0.0},
            "terminal": {"x": 1000.0, "y": 1000.0},
            "collidable": true,
            "density": 9001.0,
        }),
    );
    world.register_component(STATIC_COLLIDER, collider.clone());
    world.register_component(DYNAMIC_COLLIDER, collider);
    world.register_component(PHYSICS_STATE, json!({}));

    world.insert_resource(PhysicsModule::new(cell_size));
    world.register_system("StaticColliders", collision_system::static_colliders());
    world.register_system("CollisionResolution", rigid_body::collision_resolution());
    world.register_system("RigidBody", rigid_body::rigid_body());

    engine.events.register_handler(phases::POST_UPDATE, PhysicsModule::run_pass);
    log::info!("Physics installed (cell size {cell_size})");
}
