//! Headless test cart
//!
//! Loads a JSON cart, installs the physics module and the `moveable` demo
//! system, then drives the fixed-step loop for a number of steps, logging
//! where every rigid body ends up.
//!
//! Usage: `testcart [cart.json] [steps]`

mod moveable;

use std::path::Path;

use pokit_engine::foundation::logging;
use pokit_engine::physics::{self, ON_COLLISION_ENTER, ON_COLLISION_EXIT, RIGID_BODY};
use pokit_engine::prelude::*;

/// Cart used when no path is given
const BUILTIN_CART: &str = include_str!("../cart.json");

/// Steps run when no count is given
const DEFAULT_STEPS: u64 = 90;

/// Frames between progress reports
const REPORT_EVERY: u64 = 30;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();
    log::info!("Starting Pokit test cart");

    let mut args = std::env::args().skip(1);
    let cart = match args.next() {
        Some(path) => std::fs::read_to_string(path)?,
        None => BUILTIN_CART.to_owned(),
    };
    let steps = args.next().map(|s| s.parse::<u64>()).transpose()?.unwrap_or(DEFAULT_STEPS);

    let config = EngineConfig::load_or_default(Path::new("pokit.toml"))?;
    let mut engine = Engine::new(config);
    physics::install(&mut engine);
    moveable::register(&mut engine.world);
    engine.world.register_system(
        "ContactLog",
        System::new().on(ON_COLLISION_ENTER, log_enter).on(ON_COLLISION_EXIT, log_exit),
    );
    let mut frames = 0_u64;
    engine.events.register_handler(phases::RENDER, move |world| {
        frames += 1;
        report(world, frames)
    });
    engine.awake()?;

    let scene = engine.load_cart_json(&cart)?;
    log::info!(
        "Cart loaded: {} entities, default scene {:?}",
        engine.world.entity_count(),
        scene
    );

    let interval = engine.step_interval();
    while engine.is_running() {
        engine.tick(interval)?;
        engine.render()?;
        if engine.steps_total() >= steps {
            engine.quit();
        }
    }

    log::info!("Ran {} steps", engine.steps_total());
    Ok(())
}

fn log_enter(_: &mut World, target: Target<'_>, payload: &EventPayload) -> Result<(), EcsError> {
    if let Some(collision) = payload.collision() {
        log::info!("{:?}: contact {:?} -> {:?}", target.entities(), collision.agent, collision.collider);
    }
    Ok(())
}

fn log_exit(_: &mut World, target: Target<'_>, payload: &EventPayload) -> Result<(), EcsError> {
    if let Some(collision) = payload.collision() {
        log::info!("{:?}: released {:?} -> {:?}", target.entities(), collision.agent, collision.collider);
    }
    Ok(())
}

/// Render phase stand-in: reads positions only
fn report(world: &World, frame: u64) -> Result<(), EcsError> {
    if frame % REPORT_EVERY != 0 {
        return Ok(());
    }
    for id in world.subscriptions(RIGID_BODY) {
        let position = world.global_position(id)?;
        let name = world.entity(id)?.name().unwrap_or("<unnamed>");
        log::info!("frame {frame}: {name} at ({:.1}, {:.1})", position.x, position.y);
    }
    Ok(())
}
