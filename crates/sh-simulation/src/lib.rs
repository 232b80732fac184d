//! Tick-based economic simulation for Sternhafen.
//!
//! The [`EconomyEngine`] advances planetary economies over a
//! [`sh_core::World`]: planets produce resources, inhabited worlds consume
//! life support, and market prices take a bounded random walk. The engine
//! holds no component data of its own; its tables, trade routes, random
//! source and event bus are everything it owns.
//!
//! [`Simulation`] wraps a world, a clock and an engine into a tick loop and
//! runs collaborator [`System`]s after the economy each tick.

/// Simulation clock for tracking ticks and in-world time.
pub mod clock;
/// Configuration types for simulation runs.
pub mod config;
/// Mutable context passed to systems each tick.
pub mod context;
/// Production, consumption and market pricing.
pub mod economy;
/// Error types for the simulation crate.
pub mod error;
/// Simulation event types and the event bus.
pub mod event;
/// Deterministic random sources.
pub mod rng;
/// Top-level simulation orchestrator.
pub mod simulation;
/// The trait that collaborator systems implement.
pub mod system;
/// Trade-route registry.
pub mod trade;

/// Re-exports of [`clock::SimClock`] and [`clock::StarDate`].
pub use clock::{SimClock, StarDate};
/// Re-exports of the configuration types.
pub use config::{EconomyConfig, OverflowPolicy, PriceModel, SimConfig};
/// Re-export of [`context::SimContext`].
pub use context::SimContext;
/// Re-exports of the engine and its state.
pub use economy::{EconomyEngine, EngineState, TickSummary};
/// Re-exports of [`error::SimError`] and [`error::SimResult`].
pub use error::{SimError, SimResult};
/// Re-exports of the event types.
pub use event::{EventBus, SimEvent, SimEventKind, SubscriptionId};
/// Re-exports of the random sources.
pub use rng::{RandomSource, ReplayRng, SeededRng};
/// Re-export of [`simulation::Simulation`].
pub use simulation::Simulation;
/// Re-export of [`system::System`].
pub use system::System;
/// Re-exports of the trade-route types.
pub use trade::{RouteId, TradeRoute, TradeRoutes};
