//! Contact records and positional resolution
//!
//! Resolution works on the box each party presents in world space: half of
//! `bounds * global_scale` around the global position. The direction of
//! travel picks the axis and side of the collider that was struck; if that
//! side blocks, the agent is moved so the two boxes exactly touch.

use std::cell::Cell;

use super::block_flags::{BlockFlags, Side};
use crate::ecs::{EcsError, World};
use crate::foundation::collections::EntityId;
use crate::foundation::math::{compass, Vector};

/// Contact between a moving agent and something it overlaps
#[derive(Debug)]
pub struct Collision {
    /// Rigid body that found the contact
    pub agent: EntityId,
    /// Entity the agent overlaps
    pub collider: EntityId,
    ended: Cell<bool>,
}

impl Collision {
    /// New, unconfirmed-for-removal contact
    pub fn new(agent: EntityId, collider: EntityId) -> Self {
        Self { agent, collider, ended: Cell::new(false) }
    }

    /// Whether this record is marked for removal at the next sweep
    pub fn is_ended(&self) -> bool {
        self.ended.get()
    }

    /// Mark the record for removal at the next sweep
    pub fn end(&self) {
        self.ended.set(true);
    }

    /// The contact was seen again this pass
    pub fn confirm(&self) {
        self.ended.set(false);
    }

    /// Same agent and collider
    pub fn is_pair(&self, agent: EntityId, collider: EntityId) -> bool {
        self.agent == agent && self.collider == collider
    }
}

/// World-space box of one collision party
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Global position
    pub position: Vector,
    /// Half of `bounds * global_scale`
    pub half_extents: Vector,
}

impl Body {
    /// Current box of an entity
    pub fn of(world: &World, id: EntityId) -> Result<Self, EcsError> {
        let bounds = world.entity(id)?.bounds;
        Ok(Self {
            position: world.global_position(id)?,
            half_extents: bounds.mul_elem(world.global_scale(id)?) / 2.0,
        })
    }
}

/// Signed overlap of the agent's leading faces past the collider's trailing faces.
///
/// Axes with no movement are measured as if travelling in the positive direction.
pub fn penetration_depth(agent: &Body, collider: &Body, direction: Vector) -> Vector {
    let sign = direction.signum();
    let dir = Vector::new(
        if sign.x == 0.0 { 1.0 } else { sign.x },
        if sign.y == 0.0 { 1.0 } else { sign.y },
    );
    let leading = agent.position + agent.half_extents.mul_elem(dir);
    let trailing = collider.position - collider.half_extents.mul_elem(dir);
    leading - trailing
}

/// Surface normal pushing the agent back out, and the way it was travelling.
///
/// The horizontal axis wins when there is no vertical movement, or when the
/// agent moves horizontally and is less deep on x than on y.
pub fn face_normal(direction: Vector, depth: Vector) -> (Vector, Side) {
    if direction.y == 0.0 || (direction.x != 0.0 && depth.x.abs() < depth.y.abs()) {
        if direction.x > 0.0 {
            return (compass::WEST, Side::East);
        }
        return (compass::EAST, Side::West);
    }
    if direction.y < 0.0 {
        (compass::SOUTH, Side::North)
    } else {
        (compass::NORTH, Side::South)
    }
}

/// Agent position touching the collider along `normal`; the other axis is kept
pub fn resolved_position(agent: &Body, collider: &Body, normal: Vector) -> Vector {
    let mask = normal.abs();
    let offset = (agent.half_extents + collider.half_extents).mul_elem(mask).mul_elem(normal);
    Vector::new(
        if mask.x == 0.0 { agent.position.x } else { collider.position.x + offset.x },
        if mask.y == 0.0 { agent.position.y } else { collider.position.y + offset.y },
    )
}

/// Push the agent out of the collider if the struck side blocks.
///
/// On success the agent's global position is set, the contact is ended so it
/// is not pushed again this episode, and the new position is returned.
/// Nothing happens if either party no longer exists.
pub fn resolve(world: &mut World, direction: Vector, collision: &Collision) -> Result<Option<Vector>, EcsError> {
    if !world.contains(collision.agent) || !world.contains(collision.collider) {
        return Ok(None);
    }
    let agent = Body::of(world, collision.agent)?;
    let collider = Body::of(world, collision.collider)?;
    let depth = penetration_depth(&agent, &collider, direction);
    let (normal, side) = face_normal(direction, depth);

    if !BlockFlags::of(world, collision.collider).blocks(side) {
        return Ok(None);
    }

    let position = resolved_position(&agent, &collider, normal);
    log::trace!(
        "Resolved {:?} against {:?} moving {side:?}: {:?} -> {position:?}",
        collision.agent,
        collision.collider,
        agent.position
    );
    world.set_global_position(collision.agent, position)?;
    collision.end();
    Ok(Some(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::IdentityProps;
    use crate::physics::STATIC_COLLIDER;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn body(x: f64, y: f64) -> Body {
        Body { position: Vector::new(x, y), half_extents: Vector::splat(16.0) }
    }

    #[test]
    fn test_depth_follows_travel_direction() {
        let depth = penetration_depth(&body(5.0, 0.0), &body(35.0, 0.0), Vector::new(5.0, 0.0));
        assert_relative_eq!(depth, Vector::new(2.0, 32.0));

        let depth = penetration_depth(&body(35.0, 0.0), &body(5.0, 0.0), Vector::new(-5.0, 0.0));
        assert_relative_eq!(depth, Vector::new(-2.0, 32.0));
    }

    #[test]
    fn test_normal_choice() {
        assert_eq!(face_normal(Vector::new(3.0, 0.0), Vector::ZERO), (compass::WEST, Side::East));
        assert_eq!(face_normal(Vector::new(-3.0, 0.0), Vector::ZERO), (compass::EAST, Side::West));
        assert_eq!(face_normal(Vector::new(0.0, -2.0), Vector::ZERO), (compass::SOUTH, Side::North));
        assert_eq!(face_normal(Vector::new(0.0, 2.0), Vector::ZERO), (compass::NORTH, Side::South));
        // Diagonal: shallower axis wins
        assert_eq!(face_normal(Vector::new(1.0, 1.0), Vector::new(2.0, 8.0)), (compass::WEST, Side::East));
        assert_eq!(face_normal(Vector::new(1.0, 1.0), Vector::new(8.0, 2.0)), (compass::NORTH, Side::South));
        // No movement falls back to the horizontal axis
        assert_eq!(face_normal(Vector::ZERO, Vector::new(4.0, 4.0)), (compass::EAST, Side::West));
    }

    #[test]
    fn test_resolution_keeps_the_free_axis() {
        let resolved = resolved_position(&body(5.0, 7.0), &body(35.0, 0.0), compass::WEST);
        assert_relative_eq!(resolved, Vector::new(3.0, 7.0));

        // A collider centered on zero still resolves along its axis
        let resolved = resolved_position(&body(0.0, -20.0), &body(0.0, 0.0), compass::NORTH);
        assert_relative_eq!(resolved, Vector::new(0.0, -32.0));
    }

    #[test]
    fn test_resolve_respects_block_flags() {
        let mut world = World::new();
        let scene = world.default_scene();
        let agent = world
            .create_entity(scene, &IdentityProps { position: Vector::new(5.0, 0.0), ..IdentityProps::default() })
            .unwrap();
        let wall = world
            .create_entity(scene, &IdentityProps { position: Vector::new(35.0, 0.0), ..IdentityProps::default() })
            .unwrap();
        let collision = Collision::new(agent, wall);

        world.set(wall, STATIC_COLLIDER, json!({"blockEast": true})).unwrap();
        assert_eq!(resolve(&mut world, Vector::new(5.0, 0.0), &collision).unwrap(), None);
        assert!(!collision.is_ended());

        world.set(wall, STATIC_COLLIDER, json!({"blockWest": true})).unwrap();
        let resolved = resolve(&mut world, Vector::new(5.0, 0.0), &collision).unwrap().unwrap();
        assert_relative_eq!(resolved, Vector::new(3.0, 0.0));
        assert_relative_eq!(world.global_position(agent).unwrap(), Vector::new(3.0, 0.0));
        assert!(collision.is_ended());
    }

    #[test]
    fn test_resolve_skips_destroyed_collider() {
        let mut world = World::new();
        let scene = world.default_scene();
        let agent = world.create_entity(scene, &IdentityProps::default()).unwrap();
        let wall = world.create_entity(scene, &IdentityProps::default()).unwrap();
        world.set(wall, STATIC_COLLIDER, json!({"blockWest": true})).unwrap();
        let collision = Collision::new(agent, wall);

        world.destroy_entity(wall).unwrap();
        assert_eq!(resolve(&mut world, Vector::new(5.0, 0.0), &collision).unwrap(), None);
        assert!(!collision.is_ended());
    }
}
