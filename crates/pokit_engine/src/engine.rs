//! Core engine implementation

use std::time::Duration;

use thiserror::Error;

use crate::config::{ConfigError, EngineConfig};
use crate::ecs::{events, CartManifest, EcsError, World};
use crate::events::{phases, EventBus, EventPayload};
use crate::foundation::collections::SceneId;
use crate::foundation::time::{FixedTimestep, Timer};

/// Main engine struct
///
/// The engine owns the world and the module event bus and drives the
/// fixed-timestep simulation. Rendering is a separate, variable-rate call
/// that only runs when a simulation step has happened since the last frame.
pub struct Engine {
    /// ECS world containing all scenes, entities and systems
    pub world: World,

    /// Phase handlers registered by engine modules
    pub events: EventBus,

    clock: FixedTimestep,
    timer: Timer,
    config: EngineConfig,
    dirty: bool,
    running: bool,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Self {
        log::info!(
            "Initializing engine ({} ticks per second, at most {} per frame)",
            config.tps,
            config.max_steps_per_tick
        );
        Self {
            world: World::new(),
            events: EventBus::new(),
            clock: FixedTimestep::new(config.tps, config.max_steps_per_tick),
            timer: Timer::new(),
            config,
            dirty: false,
            running: true,
        }
    }

    /// Signal that every module is installed
    pub fn awake(&mut self) -> Result<(), EngineError> {
        self.events.emit(phases::AWAKE, &mut self.world)?;
        Ok(())
    }

    /// Load a cart's templates and enter its default scene, if it names one
    pub fn load_cart(&mut self, cart: &CartManifest) -> Result<Option<SceneId>, EngineError> {
        self.world.load_stubs(cart)?;
        self.events.emit(phases::POST_LOAD, &mut self.world)?;

        let Some(name) = cart.default_scene.as_deref() else {
            log::warn!("Cart '{}' has no default scene", cart.name);
            return Ok(None);
        };
        let scene = self.world.load_scene(name, None)?;
        self.world.transition(scene)?;
        Ok(Some(scene))
    }

    /// Parse a JSON cart and load it
    pub fn load_cart_json(&mut self, json: &str) -> Result<Option<SceneId>, EngineError> {
        let cart = CartManifest::from_json_str(json)?;
        self.load_cart(&cart)
    }

    /// Feed real elapsed time and run every simulation step now due.
    ///
    /// Returns the number of steps run.
    pub fn tick(&mut self, elapsed: Duration) -> Result<u32, EngineError> {
        self.clock.accumulate(elapsed);
        let steps = self.clock.drain();
        for _ in 0..steps {
            self.step()?;
        }
        Ok(steps)
    }

    /// Run exactly one simulation step
    pub fn step(&mut self) -> Result<(), EngineError> {
        self.events.emit(phases::INPUT, &mut self.world)?;
        self.events.emit(phases::PRE_UPDATE, &mut self.world)?;
        self.world.call_event(events::UPDATE, &EventPayload::Empty)?;
        self.events.emit(phases::POST_UPDATE, &mut self.world)?;
        self.dirty = true;
        Ok(())
    }

    /// Run the render phases if the simulation advanced since the last frame.
    ///
    /// Returns whether anything was rendered.
    pub fn render(&mut self) -> Result<bool, EngineError> {
        if !self.dirty {
            return Ok(false);
        }
        self.events.emit(phases::PRE_RENDER, &mut self.world)?;
        self.events.emit(phases::RENDER, &mut self.world)?;
        self.events.emit(phases::POST_RENDER, &mut self.world)?;
        self.dirty = false;
        Ok(true)
    }

    /// One iteration of the main loop, timed by the wall clock
    pub fn frame(&mut self) -> Result<u32, EngineError> {
        let elapsed = self.timer.update();
        let steps = self.tick(elapsed)?;
        self.render()?;
        Ok(steps)
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop should keep going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Length of one simulation step
    pub fn step_interval(&self) -> Duration {
        self.clock.interval()
    }

    /// Simulation steps run since start
    pub fn steps_total(&self) -> u64 {
        self.clock.steps_total()
    }

    /// Get the ECS world
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Registry wiring or lookup error
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cart could not be parsed
    #[error("Cart parse error: {0}")]
    Cart(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{System, Target};
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Updates(u32);

    fn count_update(world: &mut World, _: Target<'_>, _: &EventPayload) -> Result<(), EcsError> {
        if let Some(updates) = world.resource_mut::<Updates>() {
            updates.0 += 1;
        }
        Ok(())
    }

    fn engine() -> Engine {
        let mut engine = Engine::new(EngineConfig { tps: 10, ..EngineConfig::default() });
        engine.world.insert_resource(Updates::default());
        engine.world.register_system("Counter", System::new().on_update(count_update));
        engine
    }

    #[test]
    fn test_tick_runs_whole_steps() {
        let mut engine = engine();

        assert_eq!(engine.tick(Duration::from_millis(50)).unwrap(), 0);
        assert_eq!(engine.tick(Duration::from_millis(160)).unwrap(), 2);
        assert_eq!(engine.steps_total(), 2);
        // Counter is a batch system, called once per active scene per step
        let scenes = u32::try_from(engine.world.active_scenes().len()).unwrap();
        assert_eq!(engine.world.resource::<Updates>().unwrap().0, 2 * scenes);
    }

    #[test]
    fn test_render_only_after_simulation() {
        let mut engine = engine();
        let renders = Rc::new(Cell::new(0));
        let seen = Rc::clone(&renders);
        engine.events.register_handler(phases::RENDER, move |_| {
            seen.set(seen.get() + 1);
            Ok(())
        });

        assert!(!engine.render().unwrap());
        engine.step().unwrap();
        assert!(engine.render().unwrap());
        assert!(!engine.render().unwrap());
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_phase_order_within_a_step() {
        let mut engine = engine();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        for phase in [phases::POST_UPDATE, phases::INPUT, phases::PRE_UPDATE] {
            let order = Rc::clone(&order);
            engine.events.register_handler(phase, move |_| {
                order.borrow_mut().push(phase);
                Ok(())
            });
        }

        engine.step().unwrap();
        assert_eq!(*order.borrow(), [phases::INPUT, phases::PRE_UPDATE, phases::POST_UPDATE]);
    }

    #[test]
    fn test_cart_enters_default_scene() {
        let mut engine = engine();
        let scene = engine
            .load_cart_json(
                r#"{"name": "mini", "defaultScene": "main",
                    "entities": {"Dot": {}},
                    "scenes": {"main": {"entities": {"Dot": [{}, {}]}}}}"#,
            )
            .unwrap()
            .unwrap();

        assert!(engine.world.scene(scene).unwrap().is_active());
        assert_eq!(engine.world.entity_count(), 2);
        assert!(matches!(engine.load_cart_json("{not json"), Err(EngineError::Cart(_))));
    }
}
