//! Hierarchical transforms
//!
//! Global values compose an entity's local transform with its parent's
//! global transform:
//!
//! - position: `rotate(local * parent_scale, parent_rotation) + parent_position`
//! - scale: `local * parent_scale`
//! - rotation: `local + parent_rotation`
//!
//! Global position is memoized per entity and recomputed whenever the
//! parent's globals or the local position differ from the cached inputs.

use super::entity::{Entity, ParentLink, TransformCache};
use super::{EcsError, World};
use crate::foundation::collections::EntityId;
use crate::foundation::math::{Aabb, Vector};

/// Global position, scale and rotation of a transform node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalTransform {
    /// World-space position
    pub position: Vector,
    /// World-space scale
    pub scale: Vector,
    /// World-space rotation in degrees
    pub rotation: f64,
}

impl GlobalTransform {
    /// The world origin
    pub const IDENTITY: Self = Self {
        position: Vector::ZERO,
        scale: Vector::ONE,
        rotation: 0.0,
    };
}

impl World {
    /// World-space position of an entity
    pub fn global_position(&self, id: EntityId) -> Result<Vector, EcsError> {
        Ok(self.position_of(self.entity(id)?))
    }

    /// World-space scale of an entity
    pub fn global_scale(&self, id: EntityId) -> Result<Vector, EcsError> {
        Ok(self.scale_of(self.entity(id)?))
    }

    /// World-space rotation of an entity in degrees
    pub fn global_rotation(&self, id: EntityId) -> Result<f64, EcsError> {
        Ok(self.rotation_of(self.entity(id)?))
    }

    /// Place an entity at a world-space position
    pub fn set_global_position(&mut self, id: EntityId, position: Vector) -> Result<(), EcsError> {
        let parent = self.parent_transform(self.entity(id)?);
        let local = (position - parent.position)
            .rotate(-parent.rotation)
            .div_elem(parent.scale);

        let entity = self.entity_mut(id)?;
        entity.position = local;
        entity.cache.set(TransformCache {
            parent_position: parent.position,
            parent_scale: parent.scale,
            parent_rotation: parent.rotation,
            local_position: local,
            global: Some(position),
        });
        Ok(())
    }

    /// Give an entity a world-space scale
    pub fn set_global_scale(&mut self, id: EntityId, scale: Vector) -> Result<(), EcsError> {
        let parent = self.parent_transform(self.entity(id)?);
        self.entity_mut(id)?.scale = scale.div_elem(parent.scale);
        Ok(())
    }

    /// Give an entity a world-space rotation in degrees
    pub fn set_global_rotation(&mut self, id: EntityId, rotation: f64) -> Result<(), EcsError> {
        let parent = self.parent_transform(self.entity(id)?);
        self.entity_mut(id)?.rotation = rotation - parent.rotation;
        Ok(())
    }

    /// World-space collision volume: `bounds * global_scale` centered on the
    /// global position, spanning `z .. z + depth`
    pub fn aabb(&self, id: EntityId) -> Result<Aabb, EcsError> {
        let entity = self.entity(id)?;
        let size = entity.bounds.mul_elem(self.scale_of(entity));
        Ok(Aabb::from_center_size(self.position_of(entity), size, entity.z, entity.depth))
    }

    fn parent_transform(&self, entity: &Entity) -> GlobalTransform {
        if let ParentLink::Entity(parent) = entity.parent {
            if let Some(parent) = self.entities.get(parent) {
                return GlobalTransform {
                    position: self.position_of(parent),
                    scale: self.scale_of(parent),
                    rotation: self.rotation_of(parent),
                };
            }
        }
        self.scenes
            .get(entity.scene)
            .map_or(GlobalTransform::IDENTITY, |scene| GlobalTransform {
                position: scene.position,
                scale: scene.scale,
                rotation: scene.rotation,
            })
    }

    fn position_of(&self, entity: &Entity) -> Vector {
        let parent = self.parent_transform(entity);
        let cache = entity.cache.get();
        if let Some(cached) = cache.lookup(parent.position, parent.scale, parent.rotation, entity.position) {
            return cached;
        }

        let global = entity.position.mul_elem(parent.scale).rotate(parent.rotation) + parent.position;
        entity.cache.set(TransformCache {
            parent_position: parent.position,
            parent_scale: parent.scale,
            parent_rotation: parent.rotation,
            local_position: entity.position,
            global: Some(global),
        });
        global
    }

    fn scale_of(&self, entity: &Entity) -> Vector {
        entity.scale.mul_elem(self.parent_transform(entity).scale)
    }

    fn rotation_of(&self, entity: &Entity) -> f64 {
        entity.rotation + self.parent_transform(entity).rotation
    }
}
