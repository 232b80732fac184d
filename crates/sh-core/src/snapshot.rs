//! Serializable capture of a [`World`].
//!
//! The store is persisted separately from any simulation state that runs on
//! top of it. A snapshot carries the id counter, so ids handed out before
//! the snapshot are never reissued after a restore.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::world::{World, WorldMeta};

/// A complete, self-contained copy of a world's contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World metadata.
    pub meta: WorldMeta,
    /// The next id the store would allocate.
    pub next_id: u64,
    /// Every live entity, in ascending id order.
    pub entities: Vec<Entity>,
}

impl WorldSnapshot {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::InvalidSnapshot(e.to_string()))
    }

    /// Parse from JSON. Structural validation happens in [`World::from_snapshot`].
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidSnapshot(e.to_string()))
    }
}

impl World {
    /// Capture the full contents of the store.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            meta: self.meta.clone(),
            next_id: self.next_id,
            entities: self.entities.values().cloned().collect(),
        }
    }

    /// Rebuild a store from a snapshot, including its indexes.
    ///
    /// Rejects duplicate ids, ids at or above the recorded counter,
    /// components filed under the wrong kind, and components that fail
    /// their own invariants.
    pub fn from_snapshot(snapshot: WorldSnapshot) -> CoreResult<World> {
        let mut entities = BTreeMap::new();
        let mut seen = BTreeSet::new();

        for entity in snapshot.entities {
            let id = entity.id;
            if id.0 == 0 || id.0 >= snapshot.next_id {
                return Err(CoreError::InvalidSnapshot(format!(
                    "entity {id} is outside the allocated range (next id {})",
                    snapshot.next_id
                )));
            }
            if !seen.insert(id) {
                return Err(CoreError::InvalidSnapshot(format!("duplicate entity {id}")));
            }
            for (kind, component) in &entity.components {
                if component.kind() != *kind {
                    return Err(CoreError::InvalidSnapshot(format!(
                        "entity {id} files a {} component under {kind}",
                        component.kind()
                    )));
                }
                component.validate()?;
            }
            entities.insert(id, entity);
        }

        Ok(World::from_parts(snapshot.meta, entities, snapshot.next_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Atmosphere, ComponentKind, Market, Planet, PlanetKind, Resources};
    use crate::entity::EntityId;

    fn populated_world() -> World {
        let mut world = World::new(WorldMeta::new("Snapshot Test"));
        let a = world.create("Ceres");
        world
            .add_component(a, Planet::new(PlanetKind::Rocky, Atmosphere::None))
            .unwrap();
        world
            .add_component(a, Resources::new(500.0).with("minerals", 12.5))
            .unwrap();
        let b = world.create("Market Hub");
        world
            .add_component(b, Market::new().with_price("fuel", 20.0))
            .unwrap();
        let c = world.create("Removed");
        world.remove_entity(c).unwrap();
        world
    }

    #[test]
    fn snapshot_round_trip_preserves_contents() {
        let world = populated_world();
        let json = world.snapshot().to_json().unwrap();
        let restored = World::from_snapshot(WorldSnapshot::from_json(&json).unwrap()).unwrap();

        assert_eq!(restored.snapshot(), world.snapshot());
        assert_eq!(
            restored.entities_with(&[ComponentKind::Planet, ComponentKind::Resources]),
            world.entities_with(&[ComponentKind::Planet, ComponentKind::Resources]),
        );
    }

    #[test]
    fn restored_world_does_not_reuse_ids() {
        let world = populated_world();
        let before: Vec<EntityId> = world.snapshot().entities.iter().map(|e| e.id).collect();
        let mut restored = World::from_snapshot(world.snapshot()).unwrap();
        let fresh = restored.create("New");
        assert!(!before.contains(&fresh));
        // The removed entity's id (#3) stays retired too.
        assert_eq!(fresh, EntityId(4));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let world = populated_world();
        let mut snapshot = world.snapshot();
        let dup = snapshot.entities[0].clone();
        snapshot.entities.push(dup);
        assert!(matches!(
            World::from_snapshot(snapshot),
            Err(CoreError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn ids_beyond_counter_rejected() {
        let world = populated_world();
        let mut snapshot = world.snapshot();
        snapshot.next_id = 1;
        assert!(World::from_snapshot(snapshot).is_err());
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(WorldSnapshot::from_json("{ not json").is_err());
        let negative_stock = r#"{
            "meta": {"name": "x", "schema_version": 1, "created_at": "2024-01-01T00:00:00Z"},
            "next_id": 2,
            "entities": [{
                "id": 1,
                "label": "bad",
                "components": {"resources": {"kind": "resources", "data": {"stored": {"water": -5.0}, "capacity": 10.0}}}
            }]
        }"#;
        assert!(WorldSnapshot::from_json(negative_stock).is_err());
    }

    #[test]
    fn mismatched_component_kind_rejected() {
        let json = r#"{
            "meta": {"name": "x", "schema_version": 1, "created_at": "2024-01-01T00:00:00Z"},
            "next_id": 2,
            "entities": [{
                "id": 1,
                "label": "confused",
                "components": {"planet": {"kind": "market", "data": {}}}
            }]
        }"#;
        let snapshot = WorldSnapshot::from_json(json).unwrap();
        assert!(World::from_snapshot(snapshot).is_err());
    }
}
