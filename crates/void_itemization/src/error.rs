//! Error types for the itemization system

use crate::entry::ItemHandle;
use thiserror::Error;

/// Itemization errors
///
/// Policy vetoes are not errors: a vetoed give reports the units it could not
/// place as `excess`, and a vetoed remove returns `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemizationError {
    /// Definition missing, unknown or malformed
    #[error("Invalid item definition: {0}")]
    InvalidDefinition(String),

    /// Mutation attempted on a store that does not hold authority
    #[error("Mutation requires authority")]
    NotAuthoritative,

    /// No live entry for the handle
    #[error("Item handle not found: {0}")]
    HandleNotFound(ItemHandle),

    /// The item is already bound to an equipment entry
    #[error("Item already equipped: {0}")]
    AlreadyEquipped(ItemHandle),

    /// The item's definition does not allow equipping
    #[error("Item cannot be equipped: {0}")]
    NotEquippable(ItemHandle),

    /// Clear-all and gives were both requested inside one locked region
    #[error("Clear-all requested while locked discarded {discarded_adds} pending add(s)")]
    AmbiguousScopeLockOutcome { discarded_adds: usize },

    /// Replicated state offered to a store that holds authority
    #[error("Operation is only valid on a replica")]
    ReplicaOnly,

    /// Invalid configuration
    #[error("Invalid itemization configuration: {0}")]
    Config(String),
}

/// Result type for itemization operations
pub type Result<T> = std::result::Result<T, ItemizationError>;
