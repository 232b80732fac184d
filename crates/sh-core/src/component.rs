use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};

/// The closed set of component kinds an entity can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Physical body data: kind, atmosphere, population.
    Planet,
    /// Stored resource quantities with a capacity ceiling.
    Resources,
    /// Local market prices and supply/demand signals.
    Market,
    /// Carried items.
    Inventory,
    /// Items worn or mounted in slots.
    Equipment,
    /// Known entities and standing with them.
    Contacts,
    /// Trained skill levels.
    Skills,
    /// Base attributes.
    Attributes,
    /// Vital statistics and credits.
    Stats,
    /// Where a player currently is.
    PlayerLocation,
    /// Display identity.
    Identity,
}

impl ComponentKind {
    /// Every component kind, in catalogue order.
    pub const ALL: [ComponentKind; 11] = [
        Self::Planet,
        Self::Resources,
        Self::Market,
        Self::Inventory,
        Self::Equipment,
        Self::Contacts,
        Self::Skills,
        Self::Attributes,
        Self::Stats,
        Self::PlayerLocation,
        Self::Identity,
    ];

    /// Parse a kind from its snake_case name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// The snake_case name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planet => "planet",
            Self::Resources => "resources",
            Self::Market => "market",
            Self::Inventory => "inventory",
            Self::Equipment => "equipment",
            Self::Contacts => "contacts",
            Self::Skills => "skills",
            Self::Attributes => "attributes",
            Self::Stats => "stats",
            Self::PlayerLocation => "player_location",
            Self::Identity => "identity",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed data fragment attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Component {
    /// See [`Planet`].
    Planet(Planet),
    /// See [`Resources`].
    Resources(Resources),
    /// See [`Market`].
    Market(Market),
    /// See [`Inventory`].
    Inventory(Inventory),
    /// See [`Equipment`].
    Equipment(Equipment),
    /// See [`Contacts`].
    Contacts(Contacts),
    /// See [`Skills`].
    Skills(Skills),
    /// See [`Attributes`].
    Attributes(Attributes),
    /// See [`Stats`].
    Stats(Stats),
    /// See [`PlayerLocation`].
    PlayerLocation(PlayerLocation),
    /// See [`Identity`].
    Identity(Identity),
}

impl Component {
    /// The kind tag of this component.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Planet(_) => ComponentKind::Planet,
            Self::Resources(_) => ComponentKind::Resources,
            Self::Market(_) => ComponentKind::Market,
            Self::Inventory(_) => ComponentKind::Inventory,
            Self::Equipment(_) => ComponentKind::Equipment,
            Self::Contacts(_) => ComponentKind::Contacts,
            Self::Skills(_) => ComponentKind::Skills,
            Self::Attributes(_) => ComponentKind::Attributes,
            Self::Stats(_) => ComponentKind::Stats,
            Self::PlayerLocation(_) => ComponentKind::PlayerLocation,
            Self::Identity(_) => ComponentKind::Identity,
        }
    }

    /// Check the field invariants of this component.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: String| {
            Err(CoreError::InvalidComponent {
                kind: self.kind(),
                reason,
            })
        };
        match self {
            Self::Planet(p) => {
                if !(p.environment_multiplier.is_finite() && p.environment_multiplier > 0.0) {
                    return invalid(format!(
                        "environment multiplier must be positive, got {}",
                        p.environment_multiplier
                    ));
                }
            }
            // Resources enforce their own bounds on every write.
            Self::Resources(_) => {}
            Self::Market(m) => {
                if let Err(reason) = m.check() {
                    return invalid(reason);
                }
            }
            Self::Stats(s) => {
                if s.health > s.max_health || s.energy > s.max_energy {
                    return invalid("current value exceeds its maximum".to_string());
                }
            }
            Self::Inventory(inv) => {
                if inv.items.len() > inv.max_slots as usize {
                    return invalid(format!(
                        "{} item stacks exceed {} slots",
                        inv.items.len(),
                        inv.max_slots
                    ));
                }
            }
            Self::Equipment(_)
            | Self::Contacts(_)
            | Self::Skills(_)
            | Self::Attributes(_)
            | Self::PlayerLocation(_)
            | Self::Identity(_) => {}
        }
        Ok(())
    }
}

/// Typed access to one variant of [`Component`].
///
/// Implemented for every schema struct so the store can hand out
/// `&Resources` instead of a `&Component` the caller has to match on.
pub trait ComponentData: Sized + Into<Component> {
    /// The kind tag this type is stored under.
    const KIND: ComponentKind;

    /// Borrow the typed data if `component` holds this kind.
    fn from_ref(component: &Component) -> Option<&Self>;

    /// Mutably borrow the typed data if `component` holds this kind.
    fn from_mut(component: &mut Component) -> Option<&mut Self>;
}

macro_rules! impl_component_data {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<$name> for Component {
                fn from(data: $name) -> Self {
                    Component::$name(data)
                }
            }

            impl ComponentData for $name {
                const KIND: ComponentKind = ComponentKind::$name;

                fn from_ref(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$name(data) => Some(data),
                        _ => None,
                    }
                }

                fn from_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$name(data) => Some(data),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_component_data!(
    Planet,
    Resources,
    Market,
    Inventory,
    Equipment,
    Contacts,
    Skills,
    Attributes,
    Stats,
    PlayerLocation,
    Identity,
);

// ---------------------------------------------------------------------------
// Planet
// ---------------------------------------------------------------------------

/// Planet classification, used to pick a production profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanetKind {
    /// Solid silicate world.
    Rocky,
    /// Global ocean.
    Ocean,
    /// Earth-like, mixed biomes.
    Temperate,
    /// Arid surface.
    Desert,
    /// Frozen surface.
    Ice,
    /// Gas envelope without a solid surface.
    GasGiant,
    /// Tectonically active surface.
    Volcanic,
}

impl PlanetKind {
    /// Every planet kind.
    pub const ALL: [PlanetKind; 7] = [
        Self::Rocky,
        Self::Ocean,
        Self::Temperate,
        Self::Desert,
        Self::Ice,
        Self::GasGiant,
        Self::Volcanic,
    ];
}

impl fmt::Display for PlanetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Rocky => "rocky",
            Self::Ocean => "ocean",
            Self::Temperate => "temperate",
            Self::Desert => "desert",
            Self::Ice => "ice",
            Self::GasGiant => "gas_giant",
            Self::Volcanic => "volcanic",
        };
        f.write_str(s)
    }
}

/// Atmosphere class of a planet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Atmosphere {
    /// Vacuum.
    #[default]
    None,
    /// Low pressure but breathable with effort.
    Thin,
    /// Fully breathable.
    Breathable,
    /// High pressure, not breathable unassisted.
    Dense,
    /// Poisonous.
    Toxic,
    /// Actively damaging.
    Corrosive,
}

impl Atmosphere {
    /// Whether a population can live here without sealed habitats.
    pub fn is_breathable(&self) -> bool {
        matches!(self, Self::Thin | Self::Breathable)
    }
}

impl fmt::Display for Atmosphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Thin => "thin",
            Self::Breathable => "breathable",
            Self::Dense => "dense",
            Self::Toxic => "toxic",
            Self::Corrosive => "corrosive",
        };
        f.write_str(s)
    }
}

/// A planetary body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Classification driving the production profile.
    pub kind: PlanetKind,
    /// Atmosphere class driving consumption.
    pub atmosphere: Atmosphere,
    /// Scales all production on this planet. Always positive.
    pub environment_multiplier: f64,
    /// Number of inhabitants.
    pub population: u64,
}

impl Planet {
    /// An uninhabited planet with a neutral environment.
    pub fn new(kind: PlanetKind, atmosphere: Atmosphere) -> Self {
        Self {
            kind,
            atmosphere,
            environment_multiplier: 1.0,
            population: 0,
        }
    }

    /// Set the population.
    pub fn with_population(mut self, population: u64) -> Self {
        self.population = population;
        self
    }

    /// Set the environment multiplier.
    pub fn with_environment_multiplier(mut self, multiplier: f64) -> Self {
        self.environment_multiplier = multiplier;
        self
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Resource stockpile. Every stored value stays within `[0, capacity]`;
/// the capacity applies to each resource individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResourcesData", into = "ResourcesData")]
pub struct Resources {
    stored: BTreeMap<String, f64>,
    capacity: f64,
}

#[derive(Clone, Serialize, Deserialize)]
struct ResourcesData {
    stored: BTreeMap<String, f64>,
    capacity: f64,
}

impl TryFrom<ResourcesData> for Resources {
    type Error = CoreError;

    fn try_from(data: ResourcesData) -> Result<Self, Self::Error> {
        let invalid = |reason: String| CoreError::InvalidComponent {
            kind: ComponentKind::Resources,
            reason,
        };
        if !(data.capacity.is_finite() && data.capacity >= 0.0) {
            return Err(invalid(format!("capacity {} is not usable", data.capacity)));
        }
        for (name, value) in &data.stored {
            if !value.is_finite() || *value < 0.0 || *value > data.capacity {
                return Err(invalid(format!(
                    "{name} = {value} is outside [0, {}]",
                    data.capacity
                )));
            }
        }
        Ok(Self {
            stored: data.stored,
            capacity: data.capacity,
        })
    }
}

impl From<Resources> for ResourcesData {
    fn from(r: Resources) -> Self {
        Self {
            stored: r.stored,
            capacity: r.capacity,
        }
    }
}

fn clamp_stock(value: f64, capacity: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, capacity)
    }
}

impl Resources {
    /// An empty stockpile with the given per-resource capacity.
    pub fn new(capacity: f64) -> Self {
        let capacity = if capacity.is_finite() {
            capacity.max(0.0)
        } else {
            0.0
        };
        Self {
            stored: BTreeMap::new(),
            capacity,
        }
    }

    /// Builder form of [`Resources::insert`].
    pub fn with(mut self, name: impl Into<String>, amount: f64) -> Self {
        self.insert(name, amount);
        self
    }

    /// Set a resource to `amount`, clamped into `[0, capacity]`.
    pub fn insert(&mut self, name: impl Into<String>, amount: f64) {
        self.stored
            .insert(name.into(), clamp_stock(amount, self.capacity));
    }

    /// Current amount of a resource; 0.0 when it was never stored.
    pub fn amount(&self, name: &str) -> f64 {
        self.stored.get(name).copied().unwrap_or(0.0)
    }

    /// Room left before `name` reaches capacity.
    pub fn headroom(&self, name: &str) -> f64 {
        (self.capacity - self.amount(name)).max(0.0)
    }

    /// Add up to `amount` of a resource. Returns what was actually added;
    /// anything above capacity is not stored.
    pub fn add(&mut self, name: &str, amount: f64) -> f64 {
        let amount = clamp_stock(amount, f64::MAX);
        let current = self.amount(name);
        let next = clamp_stock(current + amount, self.capacity);
        self.stored.insert(name.to_string(), next);
        next - current
    }

    /// Remove up to `amount` of a resource. Returns what was actually
    /// removed; stock never drops below zero.
    pub fn remove(&mut self, name: &str, amount: f64) -> f64 {
        let amount = clamp_stock(amount, f64::MAX);
        let Some(current) = self.stored.get_mut(name) else {
            return 0.0;
        };
        let taken = amount.min(*current);
        *current = clamp_stock(*current - taken, self.capacity);
        taken
    }

    /// All stored resources.
    pub fn stored(&self) -> &BTreeMap<String, f64> {
        &self.stored
    }

    /// Per-resource ceiling.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Change the capacity, trimming any stock above the new ceiling.
    pub fn set_capacity(&mut self, capacity: f64) {
        self.capacity = if capacity.is_finite() {
            capacity.max(0.0)
        } else {
            0.0
        };
        for value in self.stored.values_mut() {
            *value = clamp_stock(*value, self.capacity);
        }
    }

    /// Sum over all stored resources.
    pub fn total(&self) -> f64 {
        self.stored.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// A local market. Prices are positive; supply and demand are the signals
/// the price update reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Current price per good.
    #[serde(default)]
    pub prices: BTreeMap<String, f64>,
    /// Last observed supply per good.
    #[serde(default)]
    pub supply: BTreeMap<String, f64>,
    /// Last observed demand per good.
    #[serde(default)]
    pub demand: BTreeMap<String, f64>,
}

impl Market {
    /// An empty market, waiting to be seeded with base prices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set one price.
    pub fn with_price(mut self, good: impl Into<String>, price: f64) -> Self {
        self.prices.insert(good.into(), price);
        self
    }

    /// Current price of a good, if it is traded here.
    pub fn price(&self, good: &str) -> Option<f64> {
        self.prices.get(good).copied()
    }

    fn check(&self) -> Result<(), String> {
        for (good, price) in &self.prices {
            if !(price.is_finite() && *price > 0.0) {
                return Err(format!("price of {good} must be positive, got {price}"));
            }
        }
        for (good, value) in self.supply.iter().chain(self.demand.iter()) {
            if !(value.is_finite() && *value >= 0.0) {
                return Err(format!("signal for {good} must be non-negative, got {value}"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Character-side schemas
// ---------------------------------------------------------------------------

/// Carried items, stacked by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Item name to stack size.
    pub items: BTreeMap<String, u32>,
    /// Maximum number of distinct stacks.
    pub max_slots: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            max_slots: 20,
        }
    }
}

impl Inventory {
    /// Add `count` of an item. Returns false when a new stack would not fit.
    pub fn add_item(&mut self, name: &str, count: u32) -> bool {
        if let Some(stack) = self.items.get_mut(name) {
            *stack = stack.saturating_add(count);
            return true;
        }
        if self.items.len() >= self.max_slots as usize {
            return false;
        }
        self.items.insert(name.to_string(), count);
        true
    }

    /// Remove up to `count` of an item, dropping empty stacks. Returns the
    /// number removed.
    pub fn remove_item(&mut self, name: &str, count: u32) -> u32 {
        let Some(stack) = self.items.get_mut(name) else {
            return 0;
        };
        let taken = count.min(*stack);
        *stack -= taken;
        if *stack == 0 {
            self.items.remove(name);
        }
        taken
    }
}

/// Items mounted in named slots ("weapon", "hull", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Slot name to item name.
    pub slots: BTreeMap<String, String>,
}

/// One known entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// The known entity.
    pub entity: EntityId,
    /// Standing from -100 (hostile) to 100 (trusted).
    pub standing: i32,
    /// Free-form note.
    #[serde(default)]
    pub note: String,
}

/// Entities this entity knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contacts {
    /// Known entities in the order they were met.
    pub known: Vec<Contact>,
}

impl Contacts {
    /// Look up the contact entry for an entity.
    pub fn get(&self, entity: EntityId) -> Option<&Contact> {
        self.known.iter().find(|c| c.entity == entity)
    }
}

/// Trained skills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    /// Skill name to level.
    pub levels: BTreeMap<String, u8>,
}

/// Base attributes ("strength", "cunning", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Attribute name to value.
    pub values: BTreeMap<String, i32>,
}

/// Vital statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Current health.
    pub health: u32,
    /// Health ceiling.
    pub max_health: u32,
    /// Current energy.
    pub energy: u32,
    /// Energy ceiling.
    pub max_energy: u32,
    /// Wallet balance.
    pub credits: i64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            health: 100,
            max_health: 100,
            energy: 100,
            max_energy: 100,
            credits: 0,
        }
    }
}

/// Where a player is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLocation {
    /// The body (usually a planet entity) the player is at.
    pub body: EntityId,
    /// Whether the player is docked at the body's port.
    #[serde(default)]
    pub docked: bool,
}

/// Display identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Optional title ("Captain").
    pub title: Option<String>,
    /// Optional faction tag.
    pub faction: Option<String>,
}
