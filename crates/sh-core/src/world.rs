use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentData, ComponentKind};
use crate::entity::{Entity, EntityId};
use crate::error::{CoreError, CoreResult};
use crate::query::QueryBuilder;

/// Metadata about the world itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMeta {
    /// World name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Version of the snapshot layout this world was written with.
    pub schema_version: u32,
    /// When the world was first created.
    pub created_at: DateTime<Utc>,
}

impl WorldMeta {
    /// Metadata for a freshly created world.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            schema_version: 1,
            created_at: Utc::now(),
        }
    }
}

/// The entity/component store. Owns every entity and its components.
///
/// Entities live in a `BTreeMap` so iteration is always in ascending id
/// order; the simulation depends on that for reproducible RNG consumption.
#[derive(Debug, Clone)]
pub struct World {
    /// World metadata.
    pub meta: WorldMeta,
    pub(crate) entities: BTreeMap<EntityId, Entity>,
    pub(crate) next_id: u64,

    // Indexes
    by_kind: HashMap<ComponentKind, BTreeSet<EntityId>>,
}

impl World {
    /// An empty world.
    pub fn new(meta: WorldMeta) -> Self {
        Self {
            meta,
            entities: BTreeMap::new(),
            next_id: 1,
            by_kind: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(
        meta: WorldMeta,
        entities: BTreeMap<EntityId, Entity>,
        next_id: u64,
    ) -> Self {
        let mut by_kind: HashMap<ComponentKind, BTreeSet<EntityId>> = HashMap::new();
        for (id, entity) in &entities {
            for kind in entity.kinds() {
                by_kind.entry(kind).or_default().insert(*id);
            }
        }
        Self {
            meta,
            entities,
            next_id,
            by_kind,
        }
    }

    // -----------------------------------------------------------------------
    // Entity lifecycle
    // -----------------------------------------------------------------------

    /// Allocate a fresh entity with no components.
    pub fn create(&mut self, label: impl Into<String>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(id, Entity::new(id, label));
        id
    }

    /// Whether `id` names a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Get a live entity.
    pub fn get_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Remove an entity and every component attached to it.
    pub fn remove_entity(&mut self, id: EntityId) -> CoreResult<Entity> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        for kind in entity.kinds() {
            if let Some(ids) = self.by_kind.get_mut(&kind) {
                ids.remove(&id);
            }
        }
        Ok(entity)
    }

    /// Label of an entity, or `"<unknown>"` for dead ids.
    pub fn label(&self, id: EntityId) -> &str {
        self.entities
            .get(&id)
            .map(|e| e.label.as_str())
            .unwrap_or("<unknown>")
    }

    /// First entity (lowest id) whose label matches, case-insensitively.
    pub fn find_by_label(&self, label: &str) -> Option<EntityId> {
        let needle = label.to_lowercase();
        self.entities
            .values()
            .find(|e| e.label.to_lowercase() == needle)
            .map(|e| e.id)
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// Attach a component, replacing any existing component of the same
    /// kind. Returns the replaced component.
    pub fn add_component(
        &mut self,
        id: EntityId,
        component: impl Into<Component>,
    ) -> CoreResult<Option<Component>> {
        let component = component.into();
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        component.validate()?;

        let kind = component.kind();
        self.by_kind.entry(kind).or_default().insert(id);
        Ok(entity.components.insert(kind, component))
    }

    /// The component of `kind` on `id`. `None` when the entity lacks it or
    /// does not exist.
    pub fn get_component(&self, id: EntityId, kind: ComponentKind) -> Option<&Component> {
        self.entities.get(&id).and_then(|e| e.components.get(&kind))
    }

    /// Typed read access to a component.
    pub fn get<T: ComponentData>(&self, id: EntityId) -> Option<&T> {
        self.get_component(id, T::KIND).and_then(T::from_ref)
    }

    /// Typed write access to a component.
    pub fn get_mut<T: ComponentData>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(&id)
            .and_then(|e| e.components.get_mut(&T::KIND))
            .and_then(T::from_mut)
    }

    /// Simultaneous write access to two different component kinds on the
    /// same entity.
    pub fn get_pair_mut<A: ComponentData, B: ComponentData>(
        &mut self,
        id: EntityId,
    ) -> Option<(&mut A, &mut B)> {
        if A::KIND == B::KIND {
            return None;
        }
        let entity = self.entities.get_mut(&id)?;
        let mut a = None;
        let mut b = None;
        for (kind, component) in entity.components.iter_mut() {
            if *kind == A::KIND {
                a = A::from_mut(component);
            } else if *kind == B::KIND {
                b = B::from_mut(component);
            }
        }
        Some((a?, b?))
    }

    /// Detach the component of `kind`. Returns it if it was attached.
    pub fn remove_component(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
    ) -> CoreResult<Option<Component>> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        let removed = entity.components.remove(&kind);
        if removed.is_some()
            && let Some(ids) = self.by_kind.get_mut(&kind)
        {
            ids.remove(&id);
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Ids of every entity carrying all of `kinds`, in ascending order.
    /// An empty slice matches every entity.
    pub fn entities_with(&self, kinds: &[ComponentKind]) -> Vec<EntityId> {
        let Some((first, rest)) = kinds.split_first() else {
            return self.entities.keys().copied().collect();
        };
        let Some(candidates) = self.by_kind.get(first) else {
            return Vec::new();
        };
        candidates
            .iter()
            .copied()
            .filter(|id| {
                rest.iter().all(|kind| {
                    self.by_kind
                        .get(kind)
                        .is_some_and(|ids| ids.contains(id))
                })
            })
            .collect()
    }

    /// All entities, in ascending id order.
    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Start building a query.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Count entities by component kind.
    pub fn component_counts(&self) -> BTreeMap<ComponentKind, usize> {
        self.by_kind
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(k, ids)| (*k, ids.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Atmosphere, Market, Planet, PlanetKind, Resources};

    fn test_world() -> World {
        World::new(WorldMeta::new("Test World"))
    }

    #[test]
    fn create_allocates_unique_ids() {
        let mut world = test_world();
        let a = world.create("Vesta");
        let b = world.create("Vesta");
        assert_ne!(a, b);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut world = test_world();
        let a = world.create("a");
        world.remove_entity(a).unwrap();
        let b = world.create("b");
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn add_and_get_component() {
        let mut world = test_world();
        let id = world.create("Ceres");
        world
            .add_component(id, Planet::new(PlanetKind::Rocky, Atmosphere::None))
            .unwrap();
        let planet = world.get::<Planet>(id).unwrap();
        assert_eq!(planet.kind, PlanetKind::Rocky);
        assert!(world.get::<Resources>(id).is_none());
    }

    #[test]
    fn add_component_replaces_same_kind() {
        let mut world = test_world();
        let id = world.create("Ceres");
        world.add_component(id, Resources::new(10.0)).unwrap();
        let replaced = world.add_component(id, Resources::new(20.0)).unwrap();
        assert!(matches!(replaced, Some(Component::Resources(_))));
        assert_eq!(world.get::<Resources>(id).unwrap().capacity(), 20.0);
        assert_eq!(world.entities_with(&[ComponentKind::Resources]), vec![id]);
    }

    #[test]
    fn add_component_to_unknown_entity_fails() {
        let mut world = test_world();
        let err = world
            .add_component(EntityId(99), Resources::new(10.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownEntity(EntityId(99))));
    }

    #[test]
    fn add_component_rejects_invalid_data() {
        let mut world = test_world();
        let id = world.create("Bad");
        let result = world.add_component(id, Market::new().with_price("fuel", -1.0));
        assert!(matches!(result, Err(CoreError::InvalidComponent { .. })));
        assert!(world.get::<Market>(id).is_none());
    }

    #[test]
    fn remove_entity_clears_everything() {
        let mut world = test_world();
        let id = world.create("Doomed");
        world.add_component(id, Resources::new(10.0)).unwrap();
        world.remove_entity(id).unwrap();

        assert!(world.get::<Resources>(id).is_none());
        assert!(world.entities_with(&[ComponentKind::Resources]).is_empty());
        assert!(matches!(
            world.add_component(id, Resources::new(1.0)),
            Err(CoreError::UnknownEntity(_))
        ));
        assert!(matches!(
            world.remove_entity(id),
            Err(CoreError::UnknownEntity(_))
        ));
    }

    #[test]
    fn remove_component_updates_index() {
        let mut world = test_world();
        let id = world.create("Io");
        world.add_component(id, Market::new()).unwrap();
        let removed = world.remove_component(id, ComponentKind::Market).unwrap();
        assert!(removed.is_some());
        assert!(world.entities_with(&[ComponentKind::Market]).is_empty());
        assert!(world.remove_component(id, ComponentKind::Market).unwrap().is_none());
    }

    #[test]
    fn entities_with_conjunction_is_sorted() {
        let mut world = test_world();
        let a = world.create("a");
        let b = world.create("b");
        let c = world.create("c");
        for id in [c, a] {
            world
                .add_component(id, Planet::new(PlanetKind::Ocean, Atmosphere::Breathable))
                .unwrap();
            world.add_component(id, Resources::new(10.0)).unwrap();
        }
        world.add_component(b, Resources::new(10.0)).unwrap();

        let both = world.entities_with(&[ComponentKind::Planet, ComponentKind::Resources]);
        assert_eq!(both, vec![a, c]);
        assert_eq!(world.entities_with(&[ComponentKind::Resources]), vec![a, b, c]);
        assert_eq!(world.entities_with(&[]).len(), 3);
        assert!(world.entities_with(&[ComponentKind::Stats]).is_empty());
    }

    #[test]
    fn get_pair_mut_borrows_two_kinds() {
        let mut world = test_world();
        let id = world.create("Europa");
        world.add_component(id, Market::new()).unwrap();
        world
            .add_component(id, Resources::new(10.0).with("water", 4.0))
            .unwrap();

        let (market, res) = world.get_pair_mut::<Market, Resources>(id).unwrap();
        market.supply.insert("water".into(), res.amount("water"));
        res.remove("water", 1.0);

        assert_eq!(world.get::<Market>(id).unwrap().supply["water"], 4.0);
        assert_eq!(world.get::<Resources>(id).unwrap().amount("water"), 3.0);
        assert!(world.get_pair_mut::<Market, Market>(id).is_none());
    }

    #[test]
    fn find_by_label_case_insensitive() {
        let mut world = test_world();
        let id = world.create("New Terra");
        assert_eq!(world.find_by_label("new terra"), Some(id));
        assert_eq!(world.find_by_label("old terra"), None);
        assert_eq!(world.label(id), "New Terra");
        assert_eq!(world.label(EntityId(500)), "<unknown>");
    }
}
