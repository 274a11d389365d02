//! Velocity integration and collision response for `rigidBody` entities

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::collision::resolve;
use super::{PHYSICS_STATE, RIGID_BODY};
use crate::ecs::{Component, EcsError, System, Target, World};
use crate::events::EventPayload;
use crate::foundation::math::{bring_to_zero, Vector};

/// Motion parameters of a rigid body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RigidBody {
    /// Velocity applied to the global position each step
    pub vector: Vector,
    /// One-step push added to the velocity, then cleared
    pub impulse: Vector,
    /// Added to the vertical velocity each step
    pub gravity: f64,
    /// Per-axis decay of velocity toward zero each step
    pub friction: Vector,
    /// Per-axis speed limit
    pub terminal: Vector,
    /// Whether the body takes part in collision detection
    pub collidable: bool,
    /// Mass per unit of area
    pub density: f64,
    /// Last nonzero velocity, used as the direction of travel on contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<Vector>,
    /// Fields owned by other systems
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            vector: Vector::ZERO,
            impulse: Vector::ZERO,
            gravity: 0.0,
            friction: Vector::ZERO,
            terminal: Vector::splat(1000.0),
            collidable: true,
            density: 9001.0,
            last: None,
            extra: Map::new(),
        }
    }
}

impl Component for RigidBody {
    const NAME: &'static str = RIGID_BODY;
}

impl RigidBody {
    /// Advance the velocity one step and return it.
    ///
    /// Impulse and gravity are added, friction brings each axis toward zero
    /// without crossing it, then each axis is clamped to the terminal speed.
    pub fn integrate(&mut self) -> Vector {
        let mut vector = self.vector + self.impulse;
        vector.y += self.gravity;
        vector.x = bring_to_zero(vector.x, self.friction.x);
        vector.y = bring_to_zero(vector.y, self.friction.y);
        self.vector = vector.clamp(-self.terminal, self.terminal);
        self.impulse = Vector::ZERO;
        self.vector
    }
}

/// Position history used to find the direction of travel on contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsState {
    /// Position recorded one step before `next`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<Vector>,
    /// Position at the start of the current step, or where resolution put it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Vector>,
    /// Last nonzero displacement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<Vector>,
    /// Fields owned by other systems
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Component for PhysicsState {
    const NAME: &'static str = PHYSICS_STATE;
}

/// Tracks position history and resolves contacts by displacement
pub fn collision_resolution() -> System {
    System::new()
        .with_default_component(RIGID_BODY)
        .on_init(resolution_init)
        .on_update(resolution_update)
        .on(super::ON_COLLISION_ENTER, resolution_enter)
}

/// Integrates velocity and resolves contacts by velocity; runs after everything else
pub fn rigid_body() -> System {
    System::new()
        .with_default_component(RIGID_BODY)
        .with_priority(i32::MIN)
        .on_update(body_update)
        .on(super::ON_COLLISION_ENTER, body_enter)
}

fn resolution_init(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for &id in target.entities() {
        let position = world.global_position(id)?;
        let state = PhysicsState {
            last: Some(position),
            next: Some(position),
            ..PhysicsState::default()
        };
        world.set_as(id, &state)?;
    }
    Ok(())
}

fn resolution_update(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for &id in target.entities() {
        let position = world.global_position(id)?;
        world.update_as::<PhysicsState, _>(id, |state| {
            state.last = state.next;
            state.next = Some(position);
        })?;
    }
    Ok(())
}

fn resolution_enter(world: &mut World, target: Target<'_>, payload: &EventPayload) -> Result<(), EcsError> {
    let Some(collision) = payload.collision() else {
        return Ok(());
    };
    if target.entities() != [collision.agent] || collision.is_ended() {
        return Ok(());
    }
    let id = collision.agent;
    let Some(mut state) = world.get_as::<PhysicsState>(id) else {
        return Ok(());
    };

    let position = world.global_position(id)?;
    let displacement = position - state.last.unwrap_or(position);
    if !displacement.is_zero() {
        state.valid = Some(displacement);
    }
    if let Some(resolved) = resolve(world, state.valid.unwrap_or(Vector::ZERO), collision)? {
        state.next = Some(resolved);
    }
    world.set_as(id, &state)
}

fn body_update(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for &id in target.entities() {
        if let Some(velocity) = world.update_as::<RigidBody, _>(id, RigidBody::integrate)? {
            let position = world.global_position(id)?;
            world.set_global_position(id, position + velocity)?;
        }
    }
    Ok(())
}

fn body_enter(world: &mut World, target: Target<'_>, payload: &EventPayload) -> Result<(), EcsError> {
    let Some(collision) = payload.collision() else {
        return Ok(());
    };
    if target.entities() != [collision.agent] {
        return Ok(());
    }
    let direction = world.update_as::<RigidBody, _>(collision.agent, |body| {
        if !body.vector.is_zero() {
            body.last = Some(body.vector);
        }
        body.last
    })?;
    if !collision.is_ended() {
        resolve(world, direction.flatten().unwrap_or(Vector::ZERO), collision)?;
    }
    Ok(())
}
