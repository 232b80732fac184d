//! Capture and restore of the engine's own state.
//!
//! Component data lives in the store and is persisted with
//! [`WorldSnapshot`](sh_core::WorldSnapshot). What the engine owns is its
//! tables and the trade-route registry; the random stream is not captured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::EconomyEngine;
use crate::config::EconomyConfig;
use crate::error::{SimError, SimResult};
use crate::trade::{TradeRoute, TradeRoutes};

/// Format version written by [`EconomyEngine::get_state`].
pub const STATE_VERSION: u32 = 1;

/// Everything needed to rebuild an engine's tables and routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    version: u32,
    captured_at: DateTime<Utc>,
    config: EconomyConfig,
    routes: Vec<TradeRoute>,
}

impl EngineState {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::StateCorrupt(e.to_string()))
    }

    /// Parse from JSON. Semantic checks happen in [`EconomyEngine::load_state`].
    pub fn from_json(json: &str) -> SimResult<Self> {
        serde_json::from_str(json).map_err(|e| SimError::StateCorrupt(e.to_string()))
    }

    /// Format version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// When the state was captured.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Economy tables at capture time.
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Registered routes at capture time, ordered by id.
    pub fn routes(&self) -> &[TradeRoute] {
        &self.routes
    }
}

impl EconomyEngine {
    /// Capture tables and routes.
    pub fn get_state(&self) -> EngineState {
        EngineState {
            version: STATE_VERSION,
            captured_at: Utc::now(),
            config: self.config.clone(),
            routes: self.routes.to_vec(),
        }
    }

    /// Replace tables and routes with a captured state.
    ///
    /// The whole state is checked before anything is applied; on error the
    /// engine is left exactly as it was.
    pub fn load_state(&mut self, state: EngineState) -> SimResult<()> {
        if state.version != STATE_VERSION {
            return Err(SimError::StateCorrupt(format!(
                "unsupported state version {} (expected {STATE_VERSION})",
                state.version
            )));
        }
        state
            .config
            .validate()
            .map_err(|e| SimError::StateCorrupt(e.to_string()))?;
        let routes = TradeRoutes::from_routes(state.routes)
            .map_err(|e| SimError::StateCorrupt(e.to_string()))?;

        info!(
            captured_at = %state.captured_at,
            routes = routes.len(),
            goods = state.config.base_prices.len(),
            "engine state loaded"
        );
        self.config = state.config;
        self.routes = routes;
        Ok(())
    }

    /// Parse and load a JSON state.
    pub fn load_state_json(&mut self, json: &str) -> SimResult<()> {
        self.load_state(EngineState::from_json(json)?)
    }
}

#[cfg(test)]
mod tests {
    use sh_core::{EntityId, World, WorldMeta};

    use super::*;
    use crate::trade::RouteId;

    fn engine_with_routes() -> EconomyEngine {
        let mut engine = EconomyEngine::seeded(EconomyConfig::default(), 3).unwrap();
        engine
            .add_route(
                TradeRoute::new("ice-haul", EntityId(1), EntityId(2), ["water"]),
                0,
            )
            .unwrap();
        engine
            .add_route(
                TradeRoute::new("ore-belt", EntityId(2), EntityId(3), ["minerals", "metals"]),
                0,
            )
            .unwrap();
        let mut world = World::new(WorldMeta::new("Test"));
        engine.set_base_price(&mut world, "spice", 55.0).unwrap();
        engine
    }

    #[test]
    fn state_round_trip_through_json() {
        let engine = engine_with_routes();
        let state = engine.get_state();
        assert_eq!(state.version(), STATE_VERSION);

        let json = state.to_json().unwrap();
        let mut fresh = EconomyEngine::seeded(EconomyConfig::default(), 9).unwrap();
        fresh.load_state_json(&json).unwrap();

        assert_eq!(fresh.routes(), engine.routes());
        assert_eq!(fresh.config(), engine.config());
        assert_eq!(fresh.config().base_price("spice"), Some(55.0));
    }

    #[test]
    fn malformed_json_leaves_engine_unchanged() {
        let mut engine = engine_with_routes();
        let before = engine.routes().clone();
        assert!(matches!(
            engine.load_state_json("{\"version\": 1, \"routes\": ["),
            Err(SimError::StateCorrupt(_))
        ));
        assert_eq!(engine.routes(), &before);
    }

    #[test]
    fn duplicate_routes_rejected_atomically() {
        let mut engine = engine_with_routes();
        let mut state = engine.get_state();
        state.routes.push(state.routes[0].clone());
        state.config = state.config.clone().with_base_price("relics", 300.0);

        assert!(matches!(
            engine.load_state(state),
            Err(SimError::StateCorrupt(_))
        ));
        // Neither the routes nor the config were touched.
        assert_eq!(engine.routes().len(), 2);
        assert_eq!(engine.config().base_price("relics"), None);
    }

    #[test]
    fn bad_config_or_version_rejected() {
        let mut engine = engine_with_routes();

        let mut state = engine.get_state();
        state.config.tick_hours = 0.0;
        assert!(engine.load_state(state).is_err());

        let mut state = engine.get_state();
        state.version = STATE_VERSION + 1;
        assert!(engine.load_state(state).is_err());

        let mut state = engine.get_state();
        state.routes[0].destination = state.routes[0].origin;
        assert!(engine.load_state(state).is_err());

        assert!(engine.has_route(&RouteId::new("ice-haul")));
        assert!((engine.config().tick_hours - 24.0).abs() < f64::EPSILON);
    }
}
