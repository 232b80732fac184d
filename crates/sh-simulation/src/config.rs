use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sh_core::component::PlanetKind;

use crate::clock::StarDate;
use crate::error::{SimError, SimResult};

/// One entry of a production profile: a resource and how much of it a
/// planet yields per tick before multipliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRate {
    /// Resource name.
    pub resource: String,
    /// Units per tick at environment multiplier 1.0.
    pub base_rate: f64,
}

impl ProductionRate {
    /// A profile entry.
    pub fn new(resource: impl Into<String>, base_rate: f64) -> Self {
        Self {
            resource: resource.into(),
            base_rate,
        }
    }
}

/// One life-support need: a resource consumed per inhabitant per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRate {
    /// Resource name.
    pub resource: String,
    /// Units per inhabitant per 24 in-world hours.
    pub per_capita: f64,
}

impl ConsumptionRate {
    /// A life-support entry.
    pub fn new(resource: impl Into<String>, per_capita: f64) -> Self {
        Self {
            resource: resource.into(),
            per_capita,
        }
    }
}

/// What happens to production that does not fit under capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Excess is lost.
    #[default]
    Discard,
    /// Excess is offered to the planet's other profile resources, in
    /// profile order; whatever still does not fit is lost.
    Spill,
}

/// Bounds of the multiplicative production perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarianceRange {
    /// Lowest factor.
    pub min: f64,
    /// Highest factor (exclusive).
    pub max: f64,
}

impl Default for VarianceRange {
    fn default() -> Self {
        Self { min: 0.8, max: 1.2 }
    }
}

/// Lowest price a market may quote, as a multiple of the base price.
pub const PRICE_FLOOR_RATIO: f64 = 0.5;

/// Highest price a market may quote, as a multiple of the base price.
pub const PRICE_CEILING_RATIO: f64 = 3.0;

/// Tunables of the market price walk.
///
/// The band itself is fixed at [`PRICE_FLOOR_RATIO`] and
/// [`PRICE_CEILING_RATIO`] times the base price and cannot be configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceModel {
    /// Largest relative random move per update.
    pub volatility: f64,
    /// Fraction of the gap to the base price closed each update.
    pub reversion: f64,
    /// Weight of the supply/demand imbalance.
    pub pressure_weight: f64,
    /// Relative move at or above which a price shock event is emitted.
    pub shock_threshold: f64,
}

impl Default for PriceModel {
    fn default() -> Self {
        Self {
            volatility: 0.05,
            reversion: 0.1,
            pressure_weight: 0.02,
            shock_threshold: 0.1,
        }
    }
}

impl PriceModel {
    /// Whether a neutral draw moves a price off either band edge even under
    /// full one-sided pressure.
    pub fn escapes_band(&self) -> bool {
        let pull = |edge: f64| edge + self.reversion * (1.0 - edge);
        let from_ceiling = pull(PRICE_CEILING_RATIO) * (1.0 + self.pressure_weight);
        let from_floor = pull(PRICE_FLOOR_RATIO) * (1.0 - self.pressure_weight);
        from_ceiling < PRICE_CEILING_RATIO && from_floor > PRICE_FLOOR_RATIO
    }
}

/// Lookup tables and tunables for the economic simulation.
///
/// Every field has a default, so a JSON config only needs to list what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Reference price per good; the center of its price band.
    pub base_prices: BTreeMap<String, f64>,
    /// Production profile per planet kind. Kinds without an entry produce nothing.
    pub production: BTreeMap<PlanetKind, Vec<ProductionRate>>,
    /// Per-capita life-support needs.
    pub life_support: Vec<ConsumptionRate>,
    /// Production perturbation bounds.
    pub variance: VarianceRange,
    /// Market price walk tunables.
    pub prices: PriceModel,
    /// Handling of production above capacity.
    pub overflow: OverflowPolicy,
    /// In-world hours covered by one tick.
    pub tick_hours: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        let base_prices = [
            ("minerals", 10.0),
            ("metals", 25.0),
            ("water", 5.0),
            ("organics", 8.0),
            ("fuel", 20.0),
            ("gases", 12.0),
            ("crystals", 40.0),
        ]
        .into_iter()
        .map(|(good, price)| (good.to_string(), price))
        .collect();

        let profile = |entries: &[(&str, f64)]| -> Vec<ProductionRate> {
            entries
                .iter()
                .map(|(resource, rate)| ProductionRate::new(*resource, *rate))
                .collect()
        };
        let production = BTreeMap::from([
            (PlanetKind::Rocky, profile(&[("minerals", 12.0), ("metals", 6.0)])),
            (PlanetKind::Ocean, profile(&[("water", 20.0), ("organics", 10.0)])),
            (
                PlanetKind::Temperate,
                profile(&[("organics", 15.0), ("water", 8.0)]),
            ),
            (PlanetKind::Desert, profile(&[("minerals", 8.0), ("crystals", 2.0)])),
            (PlanetKind::Ice, profile(&[("water", 15.0), ("gases", 4.0)])),
            (PlanetKind::GasGiant, profile(&[("gases", 20.0), ("fuel", 10.0)])),
            (PlanetKind::Volcanic, profile(&[("metals", 10.0), ("minerals", 6.0)])),
        ]);

        Self {
            base_prices,
            production,
            life_support: vec![
                ConsumptionRate::new("water", 0.002),
                ConsumptionRate::new("organics", 0.001),
                ConsumptionRate::new("fuel", 0.0005),
            ],
            variance: VarianceRange::default(),
            prices: PriceModel::default(),
            overflow: OverflowPolicy::default(),
            tick_hours: 24.0,
        }
    }
}

impl EconomyConfig {
    /// Set the base price of a good.
    pub fn with_base_price(mut self, good: impl Into<String>, price: f64) -> Self {
        self.base_prices.insert(good.into(), price);
        self
    }

    /// Replace the production profile of a planet kind.
    pub fn with_profile(mut self, kind: PlanetKind, rates: Vec<ProductionRate>) -> Self {
        self.production.insert(kind, rates);
        self
    }

    /// Replace the life-support table.
    pub fn with_life_support(mut self, rates: Vec<ConsumptionRate>) -> Self {
        self.life_support = rates;
        self
    }

    /// Set the production perturbation bounds.
    pub fn with_variance(mut self, min: f64, max: f64) -> Self {
        self.variance = VarianceRange { min, max };
        self
    }

    /// Set the overflow policy.
    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    /// Set the in-world hours per tick.
    pub fn with_tick_hours(mut self, hours: f64) -> Self {
        self.tick_hours = hours;
        self
    }

    /// Base price of a good, if it has one.
    pub fn base_price(&self, good: &str) -> Option<f64> {
        self.base_prices.get(good).copied()
    }

    /// Production profile of a planet kind (empty when it has none).
    pub fn profile(&self, kind: PlanetKind) -> &[ProductionRate] {
        self.production.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check every table and tunable.
    pub fn validate(&self) -> SimResult<()> {
        let fail = |msg: String| Err(SimError::InvalidConfig(msg));

        for (good, price) in &self.base_prices {
            if good.is_empty() {
                return fail("base price for an unnamed good".to_string());
            }
            if !(price.is_finite() && *price > 0.0) {
                return fail(format!("base price of {good} must be positive, got {price}"));
            }
        }

        for (kind, rates) in &self.production {
            for rate in rates {
                if rate.resource.is_empty() {
                    return fail(format!("{kind} profile has an unnamed resource"));
                }
                if !(rate.base_rate.is_finite() && rate.base_rate >= 0.0) {
                    return fail(format!(
                        "{kind} rate for {} must be non-negative, got {}",
                        rate.resource, rate.base_rate
                    ));
                }
            }
        }

        for need in &self.life_support {
            if need.resource.is_empty() {
                return fail("life support has an unnamed resource".to_string());
            }
            if !(need.per_capita.is_finite() && need.per_capita >= 0.0) {
                return fail(format!(
                    "per-capita {} must be non-negative, got {}",
                    need.resource, need.per_capita
                ));
            }
        }

        let v = self.variance;
        if !(v.min.is_finite() && v.max.is_finite() && v.min >= 0.0 && v.min <= v.max) {
            return fail(format!("variance range [{}, {}] is unusable", v.min, v.max));
        }

        let p = &self.prices;
        if !(0.0..1.0).contains(&p.volatility) {
            return fail(format!("volatility {} must be in [0, 1)", p.volatility));
        }
        if !(0.0..=1.0).contains(&p.reversion) {
            return fail(format!("reversion {} must be in [0, 1]", p.reversion));
        }
        if !(0.0..1.0).contains(&p.pressure_weight) {
            return fail(format!(
                "pressure weight {} must be in [0, 1)",
                p.pressure_weight
            ));
        }
        if !p.escapes_band() {
            return fail(format!(
                "reversion {} is too weak against pressure weight {}; prices could stick to the band edges",
                p.reversion, p.pressure_weight
            ));
        }
        if !(p.shock_threshold.is_finite() && p.shock_threshold >= 0.0) {
            return fail(format!(
                "shock threshold {} must be non-negative",
                p.shock_threshold
            ));
        }

        if !(self.tick_hours.is_finite() && self.tick_hours > 0.0) {
            return fail(format!("tick hours {} must be positive", self.tick_hours));
        }
        Ok(())
    }
}

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for deterministic simulation.
    pub seed: u64,
    /// In-world date at tick 0.
    pub start_date: StarDate,
    /// Maximum retained events (oldest dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Economy tables and tunables.
    pub economy: EconomyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_date: StarDate::default(),
            max_events: 0,
            economy: EconomyConfig::default(),
        }
    }
}

impl SimConfig {
    /// Set the RNG seed for deterministic simulation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the in-world date at tick 0.
    pub fn with_start_date(mut self, date: StarDate) -> Self {
        self.start_date = date;
        self
    }

    /// Set the number of in-world hours per simulation tick.
    pub fn with_hours_per_tick(mut self, hours: f64) -> Self {
        self.economy.tick_hours = hours;
        self
    }

    /// Set the maximum retained event count (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Replace the economy configuration.
    pub fn with_economy(mut self, economy: EconomyConfig) -> Self {
        self.economy = economy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = SimConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_events, 0);
        assert!((config.economy.tick_hours - 24.0).abs() < f64::EPSILON);
        assert!(config.economy.validate().is_ok());
    }

    #[test]
    fn config_builder_chain() {
        let config = SimConfig::default()
            .with_seed(123)
            .with_hours_per_tick(6.0)
            .with_max_events(500);
        assert_eq!(config.seed, 123);
        assert!((config.economy.tick_hours - 6.0).abs() < f64::EPSILON);
        assert_eq!(config.max_events, 500);
    }

    #[test]
    fn default_profiles_cover_every_planet_kind() {
        let config = EconomyConfig::default();
        for kind in PlanetKind::ALL {
            assert!(!config.profile(kind).is_empty(), "{kind} has no profile");
            for rate in config.profile(kind) {
                assert!(
                    config.base_price(&rate.resource).is_some(),
                    "{} has no base price",
                    rate.resource
                );
            }
        }
    }

    #[test]
    fn rocky_and_ocean_profiles() {
        let config = EconomyConfig::default();
        let rocky: Vec<&str> = config
            .profile(PlanetKind::Rocky)
            .iter()
            .map(|r| r.resource.as_str())
            .collect();
        assert_eq!(rocky, vec!["minerals", "metals"]);
        let ocean: Vec<&str> = config
            .profile(PlanetKind::Ocean)
            .iter()
            .map(|r| r.resource.as_str())
            .collect();
        assert_eq!(ocean, vec!["water", "organics"]);
    }

    #[test]
    fn validate_rejects_bad_tables() {
        let config = EconomyConfig::default().with_base_price("minerals", 0.0);
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let config = EconomyConfig::default()
            .with_profile(PlanetKind::Rocky, vec![ProductionRate::new("minerals", -1.0)]);
        assert!(config.validate().is_err());

        let config = EconomyConfig::default().with_variance(1.2, 0.8);
        assert!(config.validate().is_err());

        let config = EconomyConfig::default().with_tick_hours(0.0);
        assert!(config.validate().is_err());

        let mut config = EconomyConfig::default();
        config.prices.volatility = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_prices_that_can_stick_at_the_edges() {
        let mut config = EconomyConfig::default();
        config.prices.reversion = 0.0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        let mut config = EconomyConfig::default();
        config.prices.pressure_weight = 0.5;
        assert!(config.validate().is_err());

        // 0.1 reversion still beats 0.02 pressure from either edge.
        assert!(PriceModel::default().escapes_band());
    }

    #[test]
    fn band_fields_in_json_are_ignored() {
        let json = r#"{ "prices": { "floor_ratio": 0.1, "ceiling_ratio": 10.0 } }"#;
        let config: EconomyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.prices, PriceModel::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "base_prices": { "minerals": 11.0 }, "overflow": "spill" }"#;
        let config: EconomyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.base_price("minerals"), Some(11.0));
        assert_eq!(config.base_price("fuel"), None);
        assert_eq!(config.overflow, OverflowPolicy::Spill);
        assert_eq!(config.profile(PlanetKind::Ocean).len(), 2);
        assert_eq!(config.prices, PriceModel::default());
    }

    #[test]
    fn config_json_round_trip() {
        let config = EconomyConfig::default().with_overflow(OverflowPolicy::Spill);
        let json = serde_json::to_string(&config).unwrap();
        let back: EconomyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
