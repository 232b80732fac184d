//! Trade-route registry.
//!
//! Routes are bookkeeping only: the economy never moves goods along them.
//! Collaborator systems read them through [`SimContext`](crate::SimContext).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sh_core::EntityId;

use crate::error::{SimError, SimResult};

/// Unique name of a trade route.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(pub String);

impl RouteId {
    /// A route id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named association between two entities and the goods carried between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRoute {
    /// Registry key.
    pub id: RouteId,
    /// Where goods are loaded.
    pub origin: EntityId,
    /// Where goods are delivered.
    pub destination: EntityId,
    /// Goods carried, in priority order.
    pub goods: Vec<String>,
}

impl TradeRoute {
    /// A route definition.
    pub fn new(
        id: impl Into<String>,
        origin: EntityId,
        destination: EntityId,
        goods: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: RouteId::new(id),
            origin,
            destination,
            goods: goods.into_iter().map(Into::into).collect(),
        }
    }

    /// Check the route is usable on its own.
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |reason: &str| SimError::InvalidRoute {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        if self.id.0.is_empty() {
            return Err(invalid("empty id"));
        }
        if self.origin == self.destination {
            return Err(invalid("origin and destination are the same entity"));
        }
        if self.goods.is_empty() {
            return Err(invalid("no goods listed"));
        }
        if self.goods.iter().any(String::is_empty) {
            return Err(invalid("unnamed good"));
        }
        Ok(())
    }
}

/// All registered routes, keyed and iterated by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeRoutes {
    routes: BTreeMap<RouteId, TradeRoute>,
}

impl TradeRoutes {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list, rejecting invalid or duplicate routes.
    pub fn from_routes(routes: impl IntoIterator<Item = TradeRoute>) -> SimResult<Self> {
        let mut registry = Self::new();
        for route in routes {
            registry.insert(route)?;
        }
        Ok(registry)
    }

    /// Register a route.
    pub fn insert(&mut self, route: TradeRoute) -> SimResult<()> {
        route.validate()?;
        if self.routes.contains_key(&route.id) {
            return Err(SimError::DuplicateRoute(route.id));
        }
        self.routes.insert(route.id.clone(), route);
        Ok(())
    }

    /// Unregister a route, returning it if it existed.
    pub fn remove(&mut self, id: &RouteId) -> Option<TradeRoute> {
        self.routes.remove(id)
    }

    /// Whether a route is registered.
    pub fn contains(&self, id: &RouteId) -> bool {
        self.routes.contains_key(id)
    }

    /// Look up a route.
    pub fn get(&self, id: &RouteId) -> Option<&TradeRoute> {
        self.routes.get(id)
    }

    /// All routes, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &TradeRoute> {
        self.routes.values()
    }

    /// Routes that start at `entity`.
    pub fn from_entity(&self, entity: EntityId) -> Vec<&TradeRoute> {
        self.iter().filter(|r| r.origin == entity).collect()
    }

    /// Routes that touch `entity` at either end.
    pub fn touching(&self, entity: EntityId) -> Vec<&TradeRoute> {
        self.iter()
            .filter(|r| r.origin == entity || r.destination == entity)
            .collect()
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no routes are registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn to_vec(&self) -> Vec<TradeRoute> {
        self.routes.values().cloned().collect()
    }
}
