//! Error types for the skilling-players crate.

use skilling_types::PlayerId;

/// Errors that can occur while mutating player state.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// No record exists for the player.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// Adding items would exceed the inventory capacity.
    #[error("inventory full: adding {attempted} {item} would exceed capacity (current load: {current_load}, capacity: {capacity})")]
    InventoryFull {
        /// Item being added.
        item: String,
        /// Quantity the caller attempted to add.
        attempted: u32,
        /// Units currently carried.
        current_load: u32,
        /// Maximum units carried.
        capacity: u32,
    },

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}
