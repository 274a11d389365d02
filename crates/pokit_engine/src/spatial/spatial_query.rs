//! Abstract spatial query interface for broad-phase collision detection
//!
//! The physics module talks to its indices only through this trait, so the
//! partitioning scheme can change without touching the collision pipeline.

use crate::foundation::collections::EntityId;
use crate::foundation::math::Aabb;

/// Broad-phase index over axis-aligned volumes
pub trait SpatialQuery {
    /// Insert an entity, replacing any previous entry for it
    fn insert(&mut self, entity: EntityId, aabb: Aabb);

    /// Remove an entity; false if it was not indexed
    fn remove(&mut self, entity: EntityId) -> bool;

    /// Move an entity to a new volume
    fn update(&mut self, entity: EntityId, aabb: Aabb) {
        self.remove(entity);
        self.insert(entity, aabb);
    }

    /// Every indexed entity sharing at least one cell with `aabb`, deduplicated
    fn query_nearby(&self, aabb: &Aabb) -> Vec<EntityId>;

    /// Indexed entities whose volume strictly overlaps `aabb`, excluding `entity`
    fn query_colliding(&self, entity: EntityId, aabb: &Aabb) -> Vec<EntityId>;

    /// Volume an entity was indexed with
    fn get_aabb(&self, entity: EntityId) -> Option<Aabb>;

    /// Remove every entity
    fn clear(&mut self);

    /// Number of indexed entities
    fn entity_count(&self) -> usize;
}
