use sh_core::World;
use tracing::{debug, info};

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::economy::{EconomyEngine, EngineState, TickSummary};
use crate::error::SimResult;
use crate::event::EventBus;
use crate::rng::SeededRng;
use crate::system::System;

/// The top-level simulation orchestrator.
///
/// Owns the world, clock, economy engine and registered systems.
/// Each tick runs the economy first, then every system in registration order.
pub struct Simulation {
    world: World,
    clock: SimClock,
    engine: EconomyEngine,
    systems: Vec<Box<dyn System>>,
    initialized: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick())
            .field("systems", &self.systems.len())
            .field("engine", &self.engine)
            .finish()
    }
}

impl Simulation {
    /// Wrap an existing engine. The clock starts at tick 0 on the default
    /// date and uses the engine's tick length.
    pub fn new(world: World, engine: EconomyEngine) -> Self {
        let clock = SimClock::new(Default::default(), engine.config().tick_hours);
        Self {
            world,
            clock,
            engine,
            systems: Vec::new(),
            initialized: false,
        }
    }

    /// Build the engine, RNG and event bus from a configuration.
    pub fn from_config(world: World, config: SimConfig) -> SimResult<Self> {
        let clock = SimClock::new(config.start_date, config.economy.tick_hours);
        let engine = EconomyEngine::new(
            config.economy,
            SeededRng::new(config.seed),
            EventBus::new(config.max_events),
        )?;
        Ok(Self {
            world,
            clock,
            engine,
            systems: Vec::new(),
            initialized: false,
        })
    }

    /// Register a system. Systems are ticked in registration order.
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        debug!(system = system.name(), "system registered");
        self.systems.push(Box::new(system));
    }

    /// Seed markets and initialize all registered systems. Runs once;
    /// later calls are no-ops.
    pub fn init(&mut self) -> SimResult<()> {
        if self.initialized {
            return Ok(());
        }
        let tick = self.clock.tick();
        let markets = self.engine.initialize_markets(&mut self.world, tick);

        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let (routes, events) = self.engine.routes_and_events();
            let mut ctx = SimContext {
                world: &mut self.world,
                clock: &self.clock,
                events,
                routes,
            };
            let result = system.init(&mut ctx);
            self.systems[i] = system;
            result?;
        }

        info!(
            entities = self.world.entity_count(),
            markets,
            systems = self.systems.len(),
            "simulation initialized"
        );
        self.initialized = true;
        Ok(())
    }

    /// Restore the engine's tables and routes from a captured state.
    ///
    /// The clock is retuned to the loaded tick length and market quotes are
    /// clamped into the loaded bands. On error nothing changes.
    pub fn load_engine_state(&mut self, state: EngineState) -> SimResult<()> {
        self.engine.load_state(state)?;
        let hours = self.engine.config().tick_hours;
        self.clock.set_hours_per_tick(hours);
        let clamped = self.engine.clamp_market_prices(&mut self.world);
        debug!(hours, clamped, "engine state applied to simulation");
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> SimResult<TickSummary> {
        if !self.initialized {
            self.init()?;
        }

        let tick = self.clock.advance();
        let summary = self.engine.advance_tick(&mut self.world, tick);

        for i in 0..self.systems.len() {
            let mut system = std::mem::replace(&mut self.systems[i], Box::new(NoopSystem));
            let (routes, events) = self.engine.routes_and_events();
            let mut ctx = SimContext {
                world: &mut self.world,
                clock: &self.clock,
                events,
                routes,
            };
            let result = system.tick(&mut ctx);
            self.systems[i] = system;
            result?;
        }

        Ok(summary)
    }

    /// Advance the simulation by `n` ticks, returning each tick's summary.
    pub fn run(&mut self, n: u64) -> SimResult<Vec<TickSummary>> {
        (0..n).map(|_| self.tick()).collect()
    }

    /// The component store.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the component store.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The economy engine.
    pub fn engine(&self) -> &EconomyEngine {
        &self.engine
    }

    /// Mutable access to the economy engine, e.g. to register routes.
    pub fn engine_mut(&mut self) -> &mut EconomyEngine {
        &mut self.engine
    }

    /// Simulation time.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The event bus.
    pub fn events(&self) -> &EventBus {
        self.engine.events()
    }

    /// Access a system by downcasting to a concrete type.
    pub fn get_system<T: System + 'static>(&self) -> Option<&T> {
        self.systems
            .iter()
            .find_map(|s| s.as_any().downcast_ref::<T>())
    }

    /// Access a system mutably by downcasting to a concrete type.
    pub fn get_system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|s| s.as_any_mut().downcast_mut::<T>())
    }

    /// Extract the world, consuming the simulation.
    pub fn into_world(self) -> World {
        self.world
    }

    /// The last tick processed (0 before the first).
    pub fn current_tick(&self) -> u64 {
        self.clock.tick()
    }
}

/// Placeholder system used during the swap-and-tick pattern.
#[derive(Debug)]
struct NoopSystem;

impl System for NoopSystem {
    fn name(&self) -> &str {
        "noop"
    }
    fn tick(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
