use sh_core::World;

use crate::clock::SimClock;
use crate::event::{EventBus, SimEvent, SimEventKind};
use crate::trade::TradeRoutes;

/// Mutable context passed to each system during a tick.
pub struct SimContext<'a> {
    /// The component store.
    pub world: &'a mut World,
    /// Simulation time.
    pub clock: &'a SimClock,
    /// Where events go.
    pub events: &'a mut EventBus,
    /// Registered trade routes, read-only.
    pub routes: &'a TradeRoutes,
}

impl SimContext<'_> {
    /// Emit a simulation event at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .publish(SimEvent::new(self.clock.tick(), kind, description));
    }

    /// The tick being processed.
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }
}
