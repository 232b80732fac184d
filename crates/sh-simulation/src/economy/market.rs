use sh_core::World;
use sh_core::component::{ComponentKind, Market, Resources};
use tracing::{debug, warn};

use super::EconomyEngine;
use crate::config::{PRICE_CEILING_RATIO, PRICE_FLOOR_RATIO, PriceModel};
use crate::event::SimEventKind;

/// Totals for one market update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSummary {
    /// Markets visited.
    pub markets: usize,
    /// Prices that took a step.
    pub updated: usize,
    /// Steps large enough to count as a shock.
    pub shocks: usize,
}

/// One step of the bounded, mean-reverting price walk.
///
/// `draw` is a uniform value in `[0, 1)`. The result always lies in
/// `[PRICE_FLOOR_RATIO * base, PRICE_CEILING_RATIO * base]`, whatever the
/// inputs.
pub fn next_price(
    current: f64,
    base: f64,
    draw: f64,
    supply: f64,
    demand: f64,
    model: &PriceModel,
) -> f64 {
    let floor = PRICE_FLOOR_RATIO * base;
    let ceiling = PRICE_CEILING_RATIO * base;
    let current = if current.is_finite() && current > 0.0 {
        current
    } else {
        base
    };

    let shock = (2.0 * draw - 1.0) * model.volatility;
    let walked = current * (1.0 + shock);
    let reverted = walked + model.reversion * (base - walked);

    let total = supply + demand;
    let pressured = if total > 0.0 && total.is_finite() {
        let imbalance = (demand - supply) / total;
        reverted * (1.0 + model.pressure_weight * imbalance)
    } else {
        reverted
    };

    if pressured.is_nan() {
        base
    } else {
        pressured.clamp(floor, ceiling)
    }
}

impl EconomyEngine {
    /// Clamp every quote that has a base price into its band, without a
    /// random step. Returns the number of quotes that moved.
    pub fn clamp_market_prices(&self, world: &mut World) -> usize {
        let mut clamped = 0;
        for id in world.entities_with(&[ComponentKind::Market]) {
            let Some(market) = world.get_mut::<Market>(id) else {
                continue;
            };
            for (good, quote) in market.prices.iter_mut() {
                let Some(base) = self.config.base_price(good) else {
                    continue;
                };
                let next = quote.clamp(PRICE_FLOOR_RATIO * base, PRICE_CEILING_RATIO * base);
                if next != *quote {
                    *quote = next;
                    clamped += 1;
                }
            }
        }
        clamped
    }

    /// Seed every market with base prices for the goods it does not yet
    /// price. Existing prices are left alone, so calling this again is a
    /// no-op. Returns the number of markets that gained entries.
    pub fn initialize_markets(&mut self, world: &mut World, tick: u64) -> usize {
        let mut seeded_markets = 0;

        for id in world.entities_with(&[ComponentKind::Market]) {
            let Some(market) = world.get_mut::<Market>(id) else {
                continue;
            };
            let mut seeded = Vec::new();
            for (good, base) in &self.config.base_prices {
                if !market.prices.contains_key(good) {
                    market.prices.insert(good.clone(), *base);
                    seeded.push(good.clone());
                }
            }
            if seeded.is_empty() {
                continue;
            }

            seeded_markets += 1;
            let count = seeded.len();
            self.events.emit(
                tick,
                SimEventKind::MarketInitialized {
                    entity: id,
                    goods: seeded,
                },
                format!("{} market opened with {count} goods", world.label(id)),
            );
        }

        debug!(tick, markets = seeded_markets, "markets initialized");
        seeded_markets
    }

    /// Move every market price one step along its walk.
    ///
    /// Markets that sit on a stockpile first refresh their `supply` signal
    /// from it. Goods without a base price are left untouched and draw no
    /// random number.
    pub fn update_market_prices(&mut self, world: &mut World, tick: u64) -> MarketSummary {
        let mut summary = MarketSummary::default();
        let model = &self.config.prices;

        for id in world.entities_with(&[ComponentKind::Market]) {
            if let Some((market, resources)) = world.get_pair_mut::<Market, Resources>(id) {
                for good in market.prices.keys() {
                    market.supply.insert(good.clone(), resources.amount(good));
                }
            }

            let Some(market) = world.get_mut::<Market>(id) else {
                continue;
            };
            summary.markets += 1;

            let mut shocks = Vec::new();
            for (good, price) in market.prices.iter_mut() {
                let Some(base) = self.config.base_prices.get(good).copied() else {
                    warn!(entity = %id, good, "no base price, price left unchanged");
                    continue;
                };
                let supply = market.supply.get(good).copied().unwrap_or(0.0);
                let demand = market.demand.get(good).copied().unwrap_or(0.0);
                let draw = self.rng.next_f64();

                let before = *price;
                let after = next_price(before, base, draw, supply, demand, model);
                *price = after;
                summary.updated += 1;

                if before > 0.0 && ((after - before) / before).abs() >= model.shock_threshold {
                    shocks.push((good.clone(), before, after));
                }
            }

            for (good, from, to) in shocks {
                summary.shocks += 1;
                let description = format!(
                    "{} {good} price moved {from:.2} -> {to:.2}",
                    world.label(id)
                );
                self.events.emit(
                    tick,
                    SimEventKind::PriceShock {
                        entity: id,
                        good,
                        from,
                        to,
                    },
                    description,
                );
            }
        }

        debug!(
            tick,
            markets = summary.markets,
            updated = summary.updated,
            shocks = summary.shocks,
            "market update"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use sh_core::WorldMeta;
    use sh_core::component::{Atmosphere, Planet, PlanetKind};

    use super::*;
    use crate::config::EconomyConfig;
    use crate::event::EventBus;
    use crate::rng::ReplayRng;

    fn model() -> PriceModel {
        PriceModel::default()
    }

    #[test]
    fn price_stays_in_band_at_extremes() {
        let m = model();
        assert_eq!(next_price(1e9, 10.0, 0.999, 0.0, 0.0, &m), 30.0);
        assert_eq!(next_price(1e-9, 10.0, 0.0, 0.0, 0.0, &m), 5.0);
        assert_eq!(next_price(f64::NAN, 10.0, 0.5, 0.0, 0.0, &m), 10.0);
        assert_eq!(next_price(-4.0, 10.0, 0.5, 0.0, 0.0, &m), 10.0);
    }

    #[test]
    fn neutral_draw_reverts_toward_base() {
        let m = model();
        let up = next_price(20.0, 10.0, 0.5, 0.0, 0.0, &m);
        assert!((up - 19.0).abs() < 1e-9);
        let down = next_price(6.0, 10.0, 0.5, 0.0, 0.0, &m);
        assert!((down - 6.4).abs() < 1e-9);
    }

    #[test]
    fn ceiling_is_not_sticky() {
        let m = model();
        // Even the largest upward draw cannot hold a price at the ceiling.
        let next = next_price(30.0, 10.0, 0.999_999, 0.0, 0.0, &m);
        assert!(next < 30.0);
    }

    #[test]
    fn persistent_down_draws_stay_in_band() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = world.create("Slump");
        world.add_component(id, Market::new()).unwrap();
        let rng = ReplayRng::constant(0.0).unwrap();
        let mut engine = EconomyEngine::new(EconomyConfig::default(), rng, EventBus::new(0)).unwrap();
        engine.initialize_markets(&mut world, 0);

        for tick in 1..=100 {
            engine.update_market_prices(&mut world, tick);
        }

        let minerals = world.get::<Market>(id).unwrap().price("minerals").unwrap();
        assert!(minerals > 5.0 && minerals <= 30.0, "minerals at {minerals}");
    }

    #[test]
    fn widened_band_in_config_has_no_effect() {
        let json = r#"{ "prices": { "floor_ratio": 0.1, "ceiling_ratio": 10.0, "reversion": 0.0 } }"#;
        let config: EconomyConfig = serde_json::from_str(json).unwrap();
        let rng = ReplayRng::constant(0.0).unwrap();
        assert!(EconomyEngine::new(config, rng, EventBus::new(0)).is_err());

        let json = r#"{ "prices": { "floor_ratio": 0.1, "ceiling_ratio": 10.0 } }"#;
        let config: EconomyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(next_price(1e9, 10.0, 0.999, 0.0, 0.0, &config.prices), 30.0);
        assert_eq!(next_price(0.1, 10.0, 0.0, 0.0, 0.0, &config.prices), 5.0);
    }

    #[test]
    fn demand_pushes_price_up() {
        let m = model();
        let calm = next_price(10.0, 10.0, 0.5, 50.0, 50.0, &m);
        let scarce = next_price(10.0, 10.0, 0.5, 0.0, 100.0, &m);
        let glut = next_price(10.0, 10.0, 0.5, 100.0, 0.0, &m);
        assert!(scarce > calm);
        assert!(glut < calm);
    }

    #[test]
    fn initialize_markets_is_idempotent() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = world.create("Hub");
        world
            .add_component(id, Market::new().with_price("minerals", 12.0))
            .unwrap();
        let mut engine = EconomyEngine::seeded(EconomyConfig::default(), 1).unwrap();

        assert_eq!(engine.initialize_markets(&mut world, 0), 1);
        let first = world.get::<Market>(id).unwrap().clone();
        assert_eq!(first.price("minerals"), Some(12.0));
        assert_eq!(first.price("fuel"), Some(20.0));

        assert_eq!(engine.initialize_markets(&mut world, 0), 0);
        assert_eq!(world.get::<Market>(id).unwrap(), &first);
        assert_eq!(engine.events().events_named("market_initialized").len(), 1);
    }

    #[test]
    fn goods_without_base_price_are_untouched_and_draw_nothing() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = world.create("Bazaar");
        world
            .add_component(
                id,
                Market::new().with_price("relics", 500.0).with_price("fuel", 20.0),
            )
            .unwrap();
        let rng = ReplayRng::new(vec![0.9, 0.1]).unwrap();
        let mut engine = EconomyEngine::new(EconomyConfig::default(), rng, EventBus::new(0)).unwrap();

        let summary = engine.update_market_prices(&mut world, 1);

        let market = world.get::<Market>(id).unwrap();
        assert_eq!(market.price("relics"), Some(500.0));
        // fuel consumed the first draw (0.9): 20 * 1.04 = 20.8, reverted 10% toward 20.
        assert!((market.price("fuel").unwrap() - 20.72).abs() < 1e-9);
        assert_eq!(summary.updated, 1);
    }

    #[test]
    fn supply_refreshed_from_stockpile() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = world.create("Port");
        world
            .add_component(id, Planet::new(PlanetKind::Ice, Atmosphere::Thin))
            .unwrap();
        world
            .add_component(id, Resources::new(1000.0).with("water", 640.0))
            .unwrap();
        world.add_component(id, Market::new()).unwrap();
        let mut engine = EconomyEngine::seeded(EconomyConfig::default(), 1).unwrap();
        engine.initialize_markets(&mut world, 0);

        engine.update_market_prices(&mut world, 1);

        let market = world.get::<Market>(id).unwrap();
        assert_eq!(market.supply["water"], 640.0);
        assert_eq!(market.supply["fuel"], 0.0);
    }

    #[test]
    fn large_move_emits_price_shock() {
        let mut world = World::new(WorldMeta::new("Test"));
        let id = world.create("Crash");
        // Far above the band: the clamp alone moves it by more than 10%.
        world
            .add_component(id, Market::new().with_price("minerals", 80.0))
            .unwrap();
        let rng = ReplayRng::constant(0.5).unwrap();
        let mut engine = EconomyEngine::new(EconomyConfig::default(), rng, EventBus::new(0)).unwrap();

        let summary = engine.update_market_prices(&mut world, 4);

        assert_eq!(summary.shocks, 1);
        assert_eq!(world.get::<Market>(id).unwrap().price("minerals"), Some(30.0));
        let shocks = engine.events().events_named("price_shock");
        assert_eq!(shocks.len(), 1);
        assert!(shocks[0].kind.involves(id));
    }
}
