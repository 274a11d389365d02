//! Collision detection pass
//!
//! Broad phase runs against two spatial hashes: a static index kept current
//! incrementally by the `StaticColliders` system, and a dynamic index rebuilt
//! from every `dynamicCollider` subscriber at the start of each pass. Each
//! `rigidBody` agent is queried against both.
//!
//! Contacts persist across passes as [`Collision`] records and are swept in
//! two phases: every pass confirms the records it finds again, and any record
//! left marked as ended afterwards fires `onCollisionExit` and is dropped.
//! New records fire `onCollisionEnter` on both parties.
//!
//! System callbacks never run while the module is checked out of the world;
//! events are fired between the detection and sweep phases.

use std::rc::Rc;

use super::collision::Collision;
use super::{DYNAMIC_COLLIDER, ON_COLLISION_ENTER, ON_COLLISION_EXIT, RIGID_BODY, STATIC_COLLIDER};
use crate::ecs::{EcsError, System, Target, World};
use crate::events::EventPayload;
use crate::foundation::collections::EntityId;
use crate::spatial::{SpatialHashMap, SpatialQuery};

/// Collision state owned by the physics module
///
/// Lives in the world as a resource so systems can reach the static index.
pub struct PhysicsModule {
    /// Colliders that only move when their transform is edited
    static_index: Box<dyn SpatialQuery>,

    /// Colliders that move freely, rebuilt every pass
    dynamic_index: Box<dyn SpatialQuery>,

    /// Contacts carried between passes
    collisions: Vec<Rc<Collision>>,
}

impl PhysicsModule {
    /// Create empty indices with the given cell size
    pub fn new(cell_size: f64) -> Self {
        Self::with_indices(Box::new(SpatialHashMap::new(cell_size)), Box::new(SpatialHashMap::new(cell_size)))
    }

    /// Create the module over custom broad-phase structures
    pub fn with_indices(static_index: Box<dyn SpatialQuery>, dynamic_index: Box<dyn SpatialQuery>) -> Self {
        Self {
            static_index,
            dynamic_index,
            collisions: Vec::new(),
        }
    }

    /// Contacts currently tracked
    pub fn collisions(&self) -> &[Rc<Collision>] {
        &self.collisions
    }

    /// Static broad-phase index
    pub fn static_index(&self) -> &dyn SpatialQuery {
        &*self.static_index
    }

    /// Register a static collider at its current volume
    pub fn add_static(&mut self, world: &World, id: EntityId) -> Result<(), EcsError> {
        let aabb = world.aabb(id)?;
        self.static_index.insert(id, aabb);
        Ok(())
    }

    /// Forget a static collider
    pub fn remove_static(&mut self, id: EntityId) -> bool {
        self.static_index.remove(id)
    }

    /// Re-index a static collider if its volume changed.
    ///
    /// Returns whether the index was touched.
    pub fn refresh_static(&mut self, world: &World, id: EntityId) -> Result<bool, EcsError> {
        let aabb = world.aabb(id)?;
        if self.static_index.get_aabb(id) == Some(aabb) {
            return Ok(false);
        }
        self.static_index.update(id, aabb);
        Ok(true)
    }

    /// Run one full pass: detect, fire enters, sweep, fire exits.
    ///
    /// Does nothing if the module is not installed in `world`.
    pub fn run_pass(world: &mut World) -> Result<(), EcsError> {
        let Some(entered) = world.with_resource_mut::<Self, _>(|physics, world| physics.detect(world)) else {
            return Ok(());
        };
        for collision in entered {
            log::trace!("Collision enter: {:?} -> {:?}", collision.agent, collision.collider);
            notify(world, ON_COLLISION_ENTER, &collision)?;
        }

        let exited = world.with_resource_mut::<Self, _>(|physics, _| physics.sweep()).unwrap_or_default();
        for collision in exited {
            log::trace!("Collision exit: {:?} -> {:?}", collision.agent, collision.collider);
            notify(world, ON_COLLISION_EXIT, &collision)?;
        }
        Ok(())
    }

    /// Confirm known contacts and open records for new ones
    fn detect(&mut self, world: &World) -> Vec<Rc<Collision>> {
        self.dynamic_index.clear();
        for id in world.subscriptions(DYNAMIC_COLLIDER) {
            if let Ok(aabb) = world.aabb(id) {
                self.dynamic_index.insert(id, aabb);
            }
        }

        let mut entered = Vec::new();
        for agent in world.subscriptions(RIGID_BODY) {
            if !is_collidable(world, agent) {
                continue;
            }
            let Ok(aabb) = world.aabb(agent) else {
                continue;
            };
            let candidates = self
                .static_index
                .query_colliding(agent, &aabb)
                .into_iter()
                .chain(self.dynamic_index.query_colliding(agent, &aabb));

            for collider in candidates {
                if let Some(known) = self.collisions.iter().find(|c| c.is_pair(agent, collider)) {
                    known.confirm();
                    continue;
                }
                let collision = Rc::new(Collision::new(agent, collider));
                self.collisions.push(Rc::clone(&collision));
                entered.push(collision);
            }
        }
        entered
    }

    /// Drop records left ended and mark the rest for the next pass
    fn sweep(&mut self) -> Vec<Rc<Collision>> {
        let mut exited = Vec::new();
        self.collisions.retain(|collision| {
            if collision.is_ended() {
                exited.push(Rc::clone(collision));
                return false;
            }
            collision.end();
            true
        });
        exited
    }
}

fn is_collidable(world: &World, id: EntityId) -> bool {
    world
        .get(id, RIGID_BODY)
        .and_then(|body| body.get("collidable").and_then(serde_json::Value::as_bool))
        .unwrap_or(true)
}

/// Fire a collision event on both parties that still exist
fn notify(world: &mut World, event: &str, collision: &Rc<Collision>) -> Result<(), EcsError> {
    let payload = EventPayload::Collision(Rc::clone(collision));
    for id in [collision.agent, collision.collider] {
        if world.contains(id) {
            world.call_entity_event(id, event, &payload)?;
        }
    }
    Ok(())
}

/// Keeps the static index in step with `staticCollider` entities
pub fn static_colliders() -> System {
    System::new()
        .with_default_component(STATIC_COLLIDER)
        .on_init(static_init)
        .on_update(static_update)
        .on_destroy(static_destroy)
}

fn static_init(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for &id in target.entities() {
        world
            .with_resource_mut::<PhysicsModule, _>(|physics, world| physics.add_static(world, id))
            .unwrap_or(Ok(()))?;
    }
    Ok(())
}

fn static_update(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for &id in target.entities() {
        world
            .with_resource_mut::<PhysicsModule, _>(|physics, world| physics.refresh_static(world, id))
            .unwrap_or(Ok(false))?;
    }
    Ok(())
}

fn static_destroy(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    if let Some(physics) = world.resource_mut::<PhysicsModule>() {
        for &id in target.entities() {
            physics.remove_static(id);
        }
    }
    Ok(())
}
