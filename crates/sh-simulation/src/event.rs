use std::collections::BTreeMap;
use std::fmt;

use sh_core::EntityId;

use crate::trade::RouteId;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEventKind {
    // Production
    /// A planet finished its production pass.
    ProductionCompleted {
        /// The producing entity.
        entity: EntityId,
        /// Amount actually stored per resource.
        produced: BTreeMap<String, f64>,
    },
    /// Production exceeded capacity and the excess was lost.
    ProductionOverflow {
        /// The producing entity.
        entity: EntityId,
        /// The resource that overflowed.
        resource: String,
        /// Units that could not be stored.
        discarded: f64,
    },

    // Consumption
    /// Life-support demand exceeded stock; the shortfall went unmet.
    ResourceShortage {
        /// The consuming entity.
        entity: EntityId,
        /// The resource that ran short.
        resource: String,
        /// Units of demand that could not be met.
        shortfall: f64,
    },

    // Markets
    /// A market received base prices for goods it did not yet price.
    MarketInitialized {
        /// The market entity.
        entity: EntityId,
        /// The goods that were seeded.
        goods: Vec<String>,
    },
    /// A price moved by at least the configured shock threshold in one update.
    PriceShock {
        /// The market entity.
        entity: EntityId,
        /// The good whose price moved.
        good: String,
        /// Price before the update.
        from: f64,
        /// Price after the update.
        to: f64,
    },

    // Trade routes
    /// A trade route was registered.
    RouteOpened {
        /// The new route.
        route: RouteId,
        /// Origin entity.
        origin: EntityId,
        /// Destination entity.
        destination: EntityId,
    },
    /// A trade route was removed.
    RouteClosed {
        /// The removed route.
        route: RouteId,
    },
    /// A collaborator moved goods along a route.
    TradeExecuted {
        /// The route used.
        route: RouteId,
        /// The good moved.
        good: String,
        /// Units moved.
        quantity: f64,
    },

    // Custom
    /// A user-defined event.
    Custom {
        /// A label identifying the custom event type.
        label: String,
        /// The entities involved in this custom event.
        entities: Vec<EntityId>,
    },
}

impl SimEventKind {
    /// Stable event name, as used by subscribers that filter by name.
    pub fn name(&self) -> &str {
        match self {
            Self::ProductionCompleted { .. } => "production_completed",
            Self::ProductionOverflow { .. } => "production_overflow",
            Self::ResourceShortage { .. } => "resource_shortage",
            Self::MarketInitialized { .. } => "market_initialized",
            Self::PriceShock { .. } => "price_shock",
            Self::RouteOpened { .. } => "route_opened",
            Self::RouteClosed { .. } => "route_closed",
            Self::TradeExecuted { .. } => "trade_executed",
            Self::Custom { label, .. } => label,
        }
    }

    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: EntityId) -> bool {
        match self {
            Self::ProductionCompleted { entity, .. }
            | Self::ProductionOverflow { entity, .. }
            | Self::ResourceShortage { entity, .. }
            | Self::MarketInitialized { entity, .. }
            | Self::PriceShock { entity, .. } => *entity == id,
            Self::RouteOpened {
                origin,
                destination,
                ..
            } => *origin == id || *destination == id,
            Self::RouteClosed { .. } | Self::TradeExecuted { .. } => false,
            Self::Custom { entities, .. } => entities.contains(&id),
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimEvent {
    /// The simulation tick when this event occurred.
    pub tick: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given tick, kind, and description.
    pub fn new(tick: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }

    /// Shorthand for `self.kind.name()`.
    pub fn name(&self) -> &str {
        self.kind.name()
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&SimEvent)>;

/// Publish/subscribe channel for simulation events.
///
/// Subscribers are called synchronously, in subscription order, on every
/// publish. The bus also keeps a log of published events, bounded by
/// `max_events`.
#[derive(Default)]
pub struct EventBus {
    events: Vec<SimEvent>,
    max_events: usize,
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_subscription: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.events.len())
            .field("max_events", &self.max_events)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    /// Create a new bus with the given log capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            max_events,
            ..Self::default()
        }
    }

    /// Register a handler called on every published event.
    pub fn subscribe(&mut self, handler: impl FnMut(&SimEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every subscriber and append it to the log,
    /// dropping the oldest entries if the log exceeds its capacity.
    pub fn publish(&mut self, event: SimEvent) {
        for (_, handler) in &mut self.subscribers {
            handler(&event);
        }
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Build and publish an event.
    pub fn emit(&mut self, tick: u64, kind: SimEventKind, description: impl Into<String>) {
        self.publish(SimEvent::new(tick, kind, description));
    }

    /// Return a slice of all retained events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given entity.
    pub fn events_for_entity(&self, id: EntityId) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return all events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.name() == name).collect()
    }

    /// Return the number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events are retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop the retained log. Subscribers are kept.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
