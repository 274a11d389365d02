//! The `moveable` demo component and the system that spins it

use pokit_engine::prelude::*;
use serde::{Deserialize, Serialize};

/// Component name
pub const MOVEABLE: &str = "moveable";

/// Degrees turned per simulation step
const SPIN_PER_STEP: f64 = 5.0;

/// Demo component data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Moveable {
    /// Nominal speed, read by cart scripts
    pub speed: f64,
}

impl Default for Moveable {
    fn default() -> Self {
        Self { speed: 25.0 }
    }
}

impl Component for Moveable {
    const NAME: &'static str = MOVEABLE;
}

/// Register the component default and the `Move` system
pub fn register(world: &mut World) {
    world.register_component(MOVEABLE, serde_json::json!({"speed": Moveable::default().speed}));
    world.register_system(
        "Move",
        System::new()
            .with_default_component(MOVEABLE)
            .on_init(init)
            .on_update(update)
            .on_destroy(destroy),
    );
}

fn init(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for &id in target.entities() {
        let speed = world.get_as::<Moveable>(id).map_or(0.0, |m| m.speed);
        log::debug!("Moveable {id:?} ready (speed {speed})");
    }
    Ok(())
}

fn update(world: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for &id in target.entities() {
        world.entity_mut(id)?.rotation += SPIN_PER_STEP;
    }
    Ok(())
}

fn destroy(_: &mut World, target: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
    for id in target.entities() {
        log::debug!("Moveable {id:?} gone");
    }
    Ok(())
}
