//! Core types for Sternhafen: entities, components, and the entity/component store.
//!
//! This crate holds no simulation logic. It defines the closed catalogue of
//! component kinds and the [`World`] store that maps entity ids to their
//! components. The simulation crate reads and mutates components through it.

/// Component kinds and their data shapes (planet, resources, market, etc.).
pub mod component;
/// Entity identifiers and the per-entity component map.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Query builder for selecting entities by component kind.
pub mod query;
/// Serializable capture and restore of the store.
pub mod snapshot;
/// The store that owns entities and their components.
pub mod world;

/// Re-export component types.
pub use component::{Component, ComponentData, ComponentKind};
/// Re-export core entity types.
pub use entity::{Entity, EntityId};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export snapshot type.
pub use snapshot::WorldSnapshot;
/// Re-export world model types.
pub use world::{World, WorldMeta};
