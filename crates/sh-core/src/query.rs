use crate::component::ComponentKind;
use crate::entity::{Entity, EntityId};
use crate::world::World;

/// A builder for selecting entities by the components they carry.
pub struct QueryBuilder<'w> {
    world: &'w World,
    with: Vec<ComponentKind>,
    without: Vec<ComponentKind>,
    label_contains: Option<String>,
    limit: Option<usize>,
    offset: usize,
}

impl<'w> QueryBuilder<'w> {
    /// A query matching every entity in `world`.
    pub fn new(world: &'w World) -> Self {
        Self {
            world,
            with: Vec::new(),
            without: Vec::new(),
            label_contains: None,
            limit: None,
            offset: 0,
        }
    }

    /// Require a component kind. Multiple calls form a conjunction.
    pub fn with(mut self, kind: ComponentKind) -> Self {
        self.with.push(kind);
        self
    }

    /// Exclude entities carrying a component kind.
    pub fn without(mut self, kind: ComponentKind) -> Self {
        self.without.push(kind);
        self
    }

    /// Filter to entities whose label contains the given substring (case-insensitive).
    pub fn label_contains(mut self, s: impl Into<String>) -> Self {
        self.label_contains = Some(s.into().to_lowercase());
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip the first N results.
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    /// Execute the query. Results are in ascending id order.
    pub fn execute(self) -> Vec<&'w Entity> {
        let results = self
            .world
            .entities_with(&self.with)
            .into_iter()
            .filter_map(|id| self.world.get_entity(id))
            .filter(|e| self.matches(e))
            .skip(self.offset);

        match self.limit {
            Some(limit) => results.take(limit).collect(),
            None => results.collect(),
        }
    }

    /// Execute the query, returning only ids.
    pub fn ids(self) -> Vec<EntityId> {
        self.execute().into_iter().map(|e| e.id).collect()
    }

    /// Count matching entities, ignoring limit and offset.
    pub fn count(self) -> usize {
        self.world
            .entities_with(&self.with)
            .into_iter()
            .filter_map(|id| self.world.get_entity(id))
            .filter(|e| self.matches(e))
            .count()
    }

    fn matches(&self, entity: &Entity) -> bool {
        if self.without.iter().any(|kind| entity.has(*kind)) {
            return false;
        }

        if let Some(ref s) = self.label_contains
            && !entity.label.to_lowercase().contains(s)
        {
            return false;
        }

        true
    }
}
