use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentData, ComponentKind};

/// Opaque identifier for an entity. Allocated by the [`World`](crate::World)
/// from a monotonic counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entity: an id, a human-readable label, and its components.
///
/// Each component kind appears at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier for this entity.
    pub id: EntityId,
    /// Display label. Not required to be unique.
    pub label: String,
    pub(crate) components: BTreeMap<ComponentKind, Component>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            components: BTreeMap::new(),
        }
    }

    /// Whether the entity carries a component of `kind`.
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// The component of `kind`, if attached.
    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.get(&kind)
    }

    /// Typed access to an attached component.
    pub fn get<T: ComponentData>(&self) -> Option<&T> {
        self.components.get(&T::KIND).and_then(T::from_ref)
    }

    /// All attached components, ordered by kind.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// The kinds attached to this entity, ordered.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }
}
