use std::collections::BTreeMap;

use sh_core::World;
use sh_core::component::{ComponentKind, Planet, Resources};
use tracing::{debug, trace};

use super::{EPSILON, EconomyEngine};
use crate::config::OverflowPolicy;
use crate::event::SimEventKind;

/// Totals for one production pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionSummary {
    /// Planets that had a non-empty profile.
    pub producers: usize,
    /// Units stored across all planets and resources.
    pub produced: f64,
    /// Units lost to full storage.
    pub discarded: f64,
}

impl EconomyEngine {
    /// Add each planet's production to its stockpile.
    ///
    /// Visits every entity with both `Planet` and `Resources`. For each
    /// entry of the planet kind's profile, draws one variance factor and
    /// stores `base_rate * environment_multiplier * variance`, clamped to
    /// capacity. What does not fit is handled by the overflow policy.
    pub fn process_production(&mut self, world: &mut World, tick: u64) -> ProductionSummary {
        let mut summary = ProductionSummary::default();
        let variance = self.config.variance;

        for id in world.entities_with(&[ComponentKind::Planet, ComponentKind::Resources]) {
            let Some(planet) = world.get::<Planet>(id) else {
                continue;
            };
            let multiplier = planet.environment_multiplier.max(0.0);
            let profile = self.config.profile(planet.kind);
            if profile.is_empty() {
                continue;
            }

            let yields: Vec<(&str, f64)> = profile
                .iter()
                .map(|rate| {
                    let factor = self.rng.next_in(variance.min, variance.max);
                    (rate.resource.as_str(), rate.base_rate * multiplier * factor)
                })
                .collect();

            let Some(resources) = world.get_mut::<Resources>(id) else {
                continue;
            };
            let mut produced: BTreeMap<String, f64> = BTreeMap::new();
            let mut overflow: Vec<(&str, f64)> = Vec::new();

            for (resource, amount) in &yields {
                let added = resources.add(resource, *amount);
                *produced.entry(resource.to_string()).or_default() += added;
                let excess = amount - added;
                if excess > EPSILON {
                    overflow.push((*resource, excess));
                }
            }

            if self.config.overflow == OverflowPolicy::Spill {
                for (source, excess) in overflow.iter_mut() {
                    for (target, _) in &yields {
                        if *excess <= EPSILON {
                            break;
                        }
                        if *target == *source {
                            continue;
                        }
                        let added = resources.add(target, *excess);
                        *excess -= added;
                        *produced.entry(target.to_string()).or_default() += added;
                    }
                }
            }

            let total: f64 = produced.values().sum();
            trace!(entity = %id, total, "production");
            summary.producers += 1;
            summary.produced += total;

            for (resource, discarded) in overflow {
                if discarded <= EPSILON {
                    continue;
                }
                summary.discarded += discarded;
                self.events.emit(
                    tick,
                    SimEventKind::ProductionOverflow {
                        entity: id,
                        resource: resource.to_string(),
                        discarded,
                    },
                    format!("{} storage full, {discarded:.1} {resource} lost", world.label(id)),
                );
            }

            self.events.emit(
                tick,
                SimEventKind::ProductionCompleted {
                    entity: id,
                    produced,
                },
                format!("{} produced {total:.1} units", world.label(id)),
            );
        }

        debug!(
            tick,
            producers = summary.producers,
            produced = summary.produced,
            discarded = summary.discarded,
            "production pass"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use sh_core::component::{Atmosphere, PlanetKind};
    use sh_core::{EntityId, WorldMeta};

    use super::*;
    use crate::config::{EconomyConfig, ProductionRate};
    use crate::event::EventBus;
    use crate::rng::ReplayRng;

    fn engine_with(config: EconomyConfig, draw: f64) -> EconomyEngine {
        EconomyEngine::new(config, ReplayRng::constant(draw).unwrap(), EventBus::new(0)).unwrap()
    }

    fn planet(world: &mut World, kind: PlanetKind, capacity: f64) -> EntityId {
        let id = world.create(format!("{kind} world"));
        world
            .add_component(id, Planet::new(kind, Atmosphere::None))
            .unwrap();
        world.add_component(id, Resources::new(capacity)).unwrap();
        id
    }

    #[test]
    fn rocky_planet_produces_minerals_and_metals() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = planet(&mut world, PlanetKind::Rocky, 100_000.0);
        let mut engine = engine_with(EconomyConfig::default(), 0.5);

        engine.process_production(&mut world, 1);

        let res = world.get::<Resources>(id).unwrap();
        // Draw 0.5 maps to variance 1.0, so output equals the base rate.
        assert!((res.amount("minerals") - 12.0).abs() < 1e-9);
        assert!((res.amount("metals") - 6.0).abs() < 1e-9);
        assert_eq!(res.amount("water"), 0.0);
    }

    #[test]
    fn environment_multiplier_scales_output() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = world.create("Lush");
        world
            .add_component(
                id,
                Planet::new(PlanetKind::Ocean, Atmosphere::Breathable).with_environment_multiplier(2.0),
            )
            .unwrap();
        world.add_component(id, Resources::new(1000.0)).unwrap();
        let mut engine = engine_with(EconomyConfig::default(), 0.0);

        engine.process_production(&mut world, 1);

        // 20 * 2.0 * 0.8
        let res = world.get::<Resources>(id).unwrap();
        assert!((res.amount("water") - 32.0).abs() < 1e-9);
    }

    #[test]
    fn excess_is_discarded_by_default() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = planet(&mut world, PlanetKind::Rocky, 5.0);
        let mut engine = engine_with(EconomyConfig::default(), 0.5);

        let summary = engine.process_production(&mut world, 1);

        let res = world.get::<Resources>(id).unwrap();
        assert_eq!(res.amount("minerals"), 5.0);
        assert_eq!(res.amount("metals"), 5.0);
        assert!((summary.discarded - 8.0).abs() < 1e-9);
        assert_eq!(engine.events().events_named("production_overflow").len(), 2);
    }

    #[test]
    fn spill_policy_fills_other_resources_first() {
        let config = EconomyConfig::default()
            .with_overflow(OverflowPolicy::Spill)
            .with_profile(
                PlanetKind::Rocky,
                vec![ProductionRate::new("minerals", 12.0), ProductionRate::new("metals", 2.0)],
            );
        let mut world = World::new(WorldMeta::new("Test"));
        let id = planet(&mut world, PlanetKind::Rocky, 10.0);
        let mut engine = engine_with(config, 0.5);

        let summary = engine.process_production(&mut world, 1);

        let res = world.get::<Resources>(id).unwrap();
        // 2 minerals spill into metals, which had 8 headroom left.
        assert_eq!(res.amount("minerals"), 10.0);
        assert!((res.amount("metals") - 4.0).abs() < 1e-9);
        assert_eq!(summary.discarded, 0.0);
        assert!(engine.events().events_named("production_overflow").is_empty());
    }

    #[test]
    fn entities_without_planet_or_profile_are_skipped() {
        let mut world = World::new(WorldMeta::new("Test"));
        let bare = world.create("Depot");
        world.add_component(bare, Resources::new(100.0)).unwrap();
        let barren = planet(&mut world, PlanetKind::Desert, 100.0);

        let config = EconomyConfig::default().with_profile(PlanetKind::Desert, Vec::new());
        let rng = ReplayRng::constant(0.5).unwrap();
        let mut engine = EconomyEngine::new(config, rng, EventBus::new(0)).unwrap();
        let summary = engine.process_production(&mut world, 1);

        assert_eq!(summary.producers, 0);
        assert!(world.get::<Resources>(bare).unwrap().stored().is_empty());
        assert!(world.get::<Resources>(barren).unwrap().stored().is_empty());
        assert!(engine.events().is_empty());
    }

    #[test]
    fn completion_event_reports_amounts() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = planet(&mut world, PlanetKind::GasGiant, 1000.0);
        let mut engine = engine_with(EconomyConfig::default(), 0.5);

        engine.process_production(&mut world, 3);

        let events = engine.events().events_at_tick(3);
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            SimEventKind::ProductionCompleted { entity, produced } => {
                assert_eq!(*entity, id);
                assert!((produced["gases"] - 20.0).abs() < 1e-9);
                assert!((produced["fuel"] - 10.0).abs() < 1e-9);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
