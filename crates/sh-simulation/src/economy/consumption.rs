use sh_core::World;
use sh_core::component::{ComponentKind, Market, Planet, Resources};
use tracing::{debug, trace};

use super::{EPSILON, EconomyEngine};
use crate::event::SimEventKind;

/// Totals for one consumption pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumptionSummary {
    /// Planets whose population consumed anything.
    pub consumers: usize,
    /// Units removed from stockpiles.
    pub consumed: f64,
    /// Demand that stock could not cover.
    pub shortfall: f64,
}

impl EconomyEngine {
    /// Burn life-support resources on inhabited, breathable planets.
    ///
    /// Demand per resource is `per_capita * population * tick_hours / 24`.
    /// Stock is drawn down to zero at most; unmet demand is reported as a
    /// shortage event, not an error. Planets that also carry a `Market`
    /// get their `demand` signal updated. Draws no random numbers.
    pub fn process_consumption(&mut self, world: &mut World, tick: u64) -> ConsumptionSummary {
        let mut summary = ConsumptionSummary::default();
        let days = self.config.tick_hours / 24.0;

        for id in world.entities_with(&[ComponentKind::Planet, ComponentKind::Resources]) {
            let Some(planet) = world.get::<Planet>(id) else {
                continue;
            };
            if planet.population == 0 || !planet.atmosphere.is_breathable() {
                continue;
            }
            let population = planet.population as f64;

            let Some(resources) = world.get_mut::<Resources>(id) else {
                continue;
            };
            let mut demands = Vec::with_capacity(self.config.life_support.len());
            let mut shortages = Vec::new();
            for need in &self.config.life_support {
                let demand = need.per_capita * population * days;
                if demand <= 0.0 {
                    continue;
                }
                let taken = resources.remove(&need.resource, demand);
                summary.consumed += taken;
                let shortfall = demand - taken;
                if shortfall > EPSILON {
                    shortages.push((need.resource.as_str(), shortfall));
                }
                demands.push((need.resource.as_str(), demand));
            }
            summary.consumers += 1;
            trace!(entity = %id, population, "consumption");

            if let Some(market) = world.get_mut::<Market>(id) {
                for (resource, demand) in &demands {
                    market.demand.insert(resource.to_string(), *demand);
                }
            }

            for (resource, shortfall) in shortages {
                summary.shortfall += shortfall;
                self.events.emit(
                    tick,
                    SimEventKind::ResourceShortage {
                        entity: id,
                        resource: resource.to_string(),
                        shortfall,
                    },
                    format!("{} short {shortfall:.1} {resource}", world.label(id)),
                );
            }
        }

        debug!(
            tick,
            consumers = summary.consumers,
            consumed = summary.consumed,
            shortfall = summary.shortfall,
            "consumption pass"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use sh_core::component::{Atmosphere, PlanetKind};
    use sh_core::{EntityId, WorldMeta};

    use super::*;
    use crate::config::EconomyConfig;

    fn inhabited(world: &mut World, atmosphere: Atmosphere, population: u64, stock: f64) -> EntityId {
        let id = world.create("Colony");
        world
            .add_component(
                id,
                Planet::new(PlanetKind::Temperate, atmosphere).with_population(population),
            )
            .unwrap();
        world
            .add_component(
                id,
                Resources::new(1_000_000.0)
                    .with("water", stock)
                    .with("organics", stock)
                    .with("fuel", stock),
            )
            .unwrap();
        id
    }

    #[test]
    fn consumption_scales_with_population_and_tick_length() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = inhabited(&mut world, Atmosphere::Breathable, 10_000, 1000.0);
        let config = EconomyConfig::default().with_tick_hours(12.0);
        let mut engine = EconomyEngine::seeded(config, 1).unwrap();

        engine.process_consumption(&mut world, 1);

        // 0.002 * 10_000 * 0.5 = 10 water
        let res = world.get::<Resources>(id).unwrap();
        assert!((res.amount("water") - 990.0).abs() < 1e-9);
        assert!((res.amount("organics") - 995.0).abs() < 1e-9);
        assert!((res.amount("fuel") - 997.5).abs() < 1e-9);
    }

    #[test]
    fn shortfall_clamps_at_zero_and_is_reported() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = inhabited(&mut world, Atmosphere::Thin, 1_000_000, 3.0);
        let mut engine = EconomyEngine::seeded(EconomyConfig::default(), 1).unwrap();

        let summary = engine.process_consumption(&mut world, 1);

        let res = world.get::<Resources>(id).unwrap();
        for resource in ["water", "organics", "fuel"] {
            assert_eq!(res.amount(resource), 0.0);
        }
        assert!((summary.consumed - 9.0).abs() < 1e-9);
        assert!(summary.shortfall > 0.0);
        assert_eq!(engine.events().events_named("resource_shortage").len(), 3);
    }

    #[test]
    fn unbreathable_or_empty_planets_consume_nothing() {
        let mut world = World::new(WorldMeta::new("Test"));
        let toxic = inhabited(&mut world, Atmosphere::Toxic, 5000, 100.0);
        let empty = inhabited(&mut world, Atmosphere::Breathable, 0, 100.0);
        let mut engine = EconomyEngine::seeded(EconomyConfig::default(), 1).unwrap();

        let summary = engine.process_consumption(&mut world, 1);

        assert_eq!(summary.consumers, 0);
        for id in [toxic, empty] {
            assert_eq!(world.get::<Resources>(id).unwrap().amount("water"), 100.0);
        }
    }

    #[test]
    fn market_demand_signal_is_recorded() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = inhabited(&mut world, Atmosphere::Breathable, 1000, 50.0);
        world.add_component(id, Market::new()).unwrap();
        let mut engine = EconomyEngine::seeded(EconomyConfig::default(), 1).unwrap();

        engine.process_consumption(&mut world, 1);

        let market = world.get::<Market>(id).unwrap();
        assert!((market.demand["water"] - 2.0).abs() < 1e-9);
        assert!((market.demand["fuel"] - 0.5).abs() < 1e-9);
    }
}
