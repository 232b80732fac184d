use crate::component::ComponentKind;
use crate::entity::EntityId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when manipulating the entity/component store.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The entity ID was never created or has been removed.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// A component failed its field invariants.
    #[error("invalid {kind} component: {reason}")]
    InvalidComponent {
        /// The kind of the rejected component.
        kind: ComponentKind,
        /// What was wrong with it.
        reason: String,
    },

    /// A store snapshot could not be restored.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}
