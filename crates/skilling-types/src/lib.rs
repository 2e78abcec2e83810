//! Shared type definitions for the skilling gathering engine.
//!
//! This crate is the single source of truth for identifiers and the small
//! enumerations that flow between the engine, the player store and the
//! server binary.
//!
//! # Modules
//!
//! - [`ids`] -- Player UUID wrappers and catalog key wrappers
//! - [`enums`] -- Activity families, session states, roll outcomes

pub mod enums;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{ActivityFamily, RollOutcome, SessionState};
pub use ids::{PlayerId, TargetId, ToolTierId};
