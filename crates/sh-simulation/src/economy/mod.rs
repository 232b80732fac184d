//! The economic simulation engine.
//!
//! One tick is three phases, always in this order:
//!
//! 1. **Production**: planets add resources according to their kind's
//!    profile, scaled by environment and a random variance factor.
//! 2. **Consumption**: inhabited, breathable planets burn life-support
//!    resources proportional to population and tick length.
//! 3. **Market update**: every priced good takes a bounded, mean-reverting
//!    random step nudged by supply and demand.
//!
//! RNG draw order is fixed so a run replays bit-for-bit from its seed:
//! production draws once per (planet, profile entry), walking planets in
//! ascending id and entries in profile order; consumption draws nothing;
//! the market update draws once per (market, good with a base price),
//! walking markets in ascending id and goods by name.

mod consumption;
mod market;
mod production;
mod state;

use sh_core::{EntityId, World};
use sh_core::component::PlanetKind;
use tracing::{debug, info};

use crate::config::{EconomyConfig, ProductionRate};
use crate::error::SimResult;
use crate::event::{EventBus, SimEventKind};
use crate::rng::{RandomSource, SeededRng};
use crate::trade::{RouteId, TradeRoute, TradeRoutes};

pub use consumption::ConsumptionSummary;
pub use market::{MarketSummary, next_price};
pub use production::ProductionSummary;
pub use state::{EngineState, STATE_VERSION};

/// Amounts below this are treated as zero when deciding whether to report
/// overflow or shortfall.
pub(crate) const EPSILON: f64 = 1e-9;

/// Totals for one full tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    /// The tick that was processed.
    pub tick: u64,
    /// Production phase totals.
    pub production: ProductionSummary,
    /// Consumption phase totals.
    pub consumption: ConsumptionSummary,
    /// Market phase totals.
    pub market: MarketSummary,
}

/// Drives production, consumption and market pricing over a [`World`].
///
/// The engine owns its lookup tables, the trade-route registry, the random
/// source and the event bus. It holds no component data: every pass reads
/// and writes the store it is handed.
pub struct EconomyEngine {
    config: EconomyConfig,
    routes: TradeRoutes,
    rng: Box<dyn RandomSource>,
    events: EventBus,
}

impl std::fmt::Debug for EconomyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EconomyEngine")
            .field("goods", &self.config.base_prices.len())
            .field("routes", &self.routes.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl EconomyEngine {
    /// Build an engine from a config, a random source and an event bus.
    pub fn new(
        config: EconomyConfig,
        rng: impl RandomSource + 'static,
        events: EventBus,
    ) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            routes: TradeRoutes::new(),
            rng: Box::new(rng),
            events,
        })
    }

    /// Engine with a [`SeededRng`] and an unbounded event bus.
    pub fn seeded(config: EconomyConfig, seed: u64) -> SimResult<Self> {
        Self::new(config, SeededRng::new(seed), EventBus::new(0))
    }

    /// Run one full tick: production, then consumption, then the market update.
    pub fn advance_tick(&mut self, world: &mut World, tick: u64) -> TickSummary {
        let production = self.process_production(world, tick);
        let consumption = self.process_consumption(world, tick);
        let market = self.update_market_prices(world, tick);
        debug!(
            tick,
            produced = production.produced,
            consumed = consumption.consumed,
            shocks = market.shocks,
            "economy tick complete"
        );
        TickSummary {
            tick,
            production,
            consumption,
            market,
        }
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    /// Current tables and tunables.
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Change the base price of a good. Markets that already quote the good
    /// are clamped into the new band immediately.
    pub fn set_base_price(
        &mut self,
        world: &mut World,
        good: impl Into<String>,
        price: f64,
    ) -> SimResult<()> {
        let good = good.into();
        let candidate = self.config.clone().with_base_price(good.clone(), price);
        candidate.validate()?;
        self.config = candidate;

        let clamped = self.clamp_market_prices(world);
        debug!(good = %good, price, clamped, "base price changed");
        Ok(())
    }

    /// Replace the production profile of a planet kind.
    pub fn set_production_profile(
        &mut self,
        kind: PlanetKind,
        rates: Vec<ProductionRate>,
    ) -> SimResult<()> {
        let candidate = self.config.clone().with_profile(kind, rates);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Trade routes
    // -----------------------------------------------------------------------

    /// Register a trade route.
    pub fn add_route(&mut self, route: TradeRoute, tick: u64) -> SimResult<()> {
        let (id, origin, destination) = (route.id.clone(), route.origin, route.destination);
        self.routes.insert(route)?;
        info!(route = %id, %origin, %destination, "trade route opened");
        self.events.emit(
            tick,
            SimEventKind::RouteOpened {
                route: id.clone(),
                origin,
                destination,
            },
            format!("route {id} opened from {origin} to {destination}"),
        );
        Ok(())
    }

    /// Unregister a trade route, returning it if it existed.
    pub fn remove_route(&mut self, id: &RouteId, tick: u64) -> Option<TradeRoute> {
        let removed = self.routes.remove(id)?;
        info!(route = %id, "trade route closed");
        self.events.emit(
            tick,
            SimEventKind::RouteClosed { route: id.clone() },
            format!("route {id} closed"),
        );
        Some(removed)
    }

    /// Whether a route is registered.
    pub fn has_route(&self, id: &RouteId) -> bool {
        self.routes.contains(id)
    }

    /// Look up a route.
    pub fn route(&self, id: &RouteId) -> Option<&TradeRoute> {
        self.routes.get(id)
    }

    /// Routes that start at `entity`.
    pub fn routes_from(&self, entity: EntityId) -> Vec<&TradeRoute> {
        self.routes.from_entity(entity)
    }

    /// The whole registry.
    pub fn routes(&self) -> &TradeRoutes {
        &self.routes
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// The event bus the engine publishes to.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Mutable access, for subscribing or clearing the log.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub(crate) fn routes_and_events(&mut self) -> (&TradeRoutes, &mut EventBus) {
        (&self.routes, &mut self.events)
    }
}
