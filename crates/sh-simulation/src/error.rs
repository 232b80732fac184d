use sh_core::CoreError;

use crate::trade::RouteId;

/// Alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised by the simulation crate.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A store operation failed (usually an unknown entity).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The economy configuration is unusable.
    #[error("invalid economy config: {0}")]
    InvalidConfig(String),

    /// The random source cannot produce values.
    #[error("random source unavailable: {0}")]
    RngUnavailable(String),

    /// An engine snapshot could not be loaded. Nothing was applied.
    #[error("engine state corrupt: {0}")]
    StateCorrupt(String),

    /// A trade route with this id is already registered.
    #[error("trade route already exists: {0}")]
    DuplicateRoute(RouteId),

    /// A trade route definition is malformed.
    #[error("invalid trade route {id}: {reason}")]
    InvalidRoute {
        /// The offending route id.
        id: RouteId,
        /// What is wrong with it.
        reason: String,
    },

    /// A collaborator system failed during its tick.
    #[error("system error: {0}")]
    SystemError(String),
}
