//! Error types for the battle simulation.
//!
//! Two families live here. [`GameError`] covers genuine faults (a missing
//! entity, an unparsable catalog). [`ProductionError`] covers declined
//! requests: running out of supply or stock is part of normal play, so these
//! never abort a tick and are mirrored to the notification sink instead.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for simulation faults.
#[derive(Debug, Error)]
pub enum GameError {
    /// A strict catalog lookup named a key that does not exist.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Catalog data could not be parsed.
    #[error("Failed to parse catalog: {message}")]
    CatalogParse {
        /// Parser message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl From<ron::error::SpannedError> for GameError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::CatalogParse {
            message: err.to_string(),
        }
    }
}

/// Reasons a production, construction or ability request is declined.
///
/// A declined request leaves supply, stock and cooldowns untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductionError {
    /// No units of this type remain in stock.
    #[error("{key} is out of stock")]
    OutOfStock {
        /// Unit key.
        key: String,
    },

    /// The side cannot pay the cost.
    #[error("Insufficient supply: need {required}, have {available}")]
    InsufficientSupply {
        /// Supply required.
        required: u32,
        /// Supply available (truncated).
        available: u32,
    },

    /// Production of this type is still cooling down.
    #[error("{key} is cooling down ({remaining} ticks)")]
    OnCooldown {
        /// Unit key.
        key: String,
        /// Ticks remaining.
        remaining: u32,
    },

    /// A one-per-match structure was already started.
    #[error("{key} can only be built once")]
    UniqueAlreadyBuilt {
        /// Building key.
        key: String,
    },

    /// The selected unit cannot construct buildings.
    #[error("Unit {0} is not a builder")]
    NotABuilder(EntityId),

    /// The builder already has a construction task.
    #[error("Builder {0} is busy")]
    WorkerBusy(EntityId),

    /// A designation was issued with nothing armed.
    #[error("No ability awaiting a target")]
    NoPendingDesignation,

    /// Another ability is already awaiting a target.
    #[error("{key} is already awaiting a target")]
    DesignationPending {
        /// Ability currently armed.
        key: String,
    },

    /// The key does not name a building.
    #[error("Unknown building: {0}")]
    UnknownBuilding(String),

    /// The match is no longer running.
    #[error("Match is over")]
    MatchOver,
}
